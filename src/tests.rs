//! Integration scenarios against a mock SMSC on a loopback listener.

use crate::datatypes::{Address, CommandId, CommandStatus, ShortMessage, SubmitSm, Unbind};
use crate::error::SmppError;
use crate::pdu::Pdu;
use crate::session::{ClosedState, Session, SessionSettings};
use crate::{Auth, TcpDialer};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

async fn read_pdu_raw(stream: &mut TcpStream) -> Pdu {
    let mut header = [0u8; 16];
    stream.read_exact(&mut header).await.unwrap();
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let mut rest = vec![0u8; len - 16];
    stream.read_exact(&mut rest).await.unwrap();
    let mut frame = header.to_vec();
    frame.extend_from_slice(&rest);
    let mut cursor = Cursor::new(frame.as_slice());
    Pdu::parse(&mut cursor).unwrap()
}

async fn write_pdu_raw(stream: &mut TcpStream, pdu: &Pdu) {
    stream.write_all(&pdu.to_bytes().unwrap()).await.unwrap();
}

/// Answer the client's bind request the way a friendly SMSC would.
async fn handle_bind(stream: &mut TcpStream) {
    let request = match read_pdu_raw(stream).await {
        Pdu::BindRequest(request) => request,
        other => panic!("expected a bind request, got {:?}", other.command_id()),
    };
    assert_eq!(request.system_id, "sys");
    write_pdu_raw(stream, &Pdu::BindResponse(request.response("MockSMSC"))).await;
}

/// Drain the socket until the peer closes it.
async fn drain_until_close(stream: &mut TcpStream) {
    let mut buf = [0u8; 256];
    while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
}

fn auth_for(addr: std::net::SocketAddr) -> Auth {
    Auth {
        smsc: addr.to_string(),
        system_id: "sys".into(),
        password: "pass".into(),
        system_type: String::new(),
    }
}

fn submit_hello() -> Pdu {
    Pdu::SubmitSm(Box::new(SubmitSm::new(
        Address::international("84900000001"),
        Address::international("84900000002"),
        ShortMessage::new("hello").unwrap(),
    )))
}

#[derive(Default)]
struct Observed {
    pdus: Mutex<Vec<(CommandId, bool)>>,
    closed: Mutex<Vec<ClosedState>>,
}

fn observing_settings(observed: &Arc<Observed>) -> SessionSettings {
    SessionSettings {
        // generous read deadline so an idle mock is not mistaken for a
        // dead one mid-test
        read_timeout: Duration::from_secs(30),
        on_pdu: Some({
            let observed = observed.clone();
            Arc::new(move |pdu, responded| {
                observed
                    .pdus
                    .lock()
                    .unwrap()
                    .push((pdu.command_id(), responded));
            })
        }),
        on_closed: Some({
            let observed = observed.clone();
            Arc::new(move |state| {
                observed.closed.lock().unwrap().push(state);
            })
        }),
        ..Default::default()
    }
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

// Bind as transceiver, submit one message, observe the response
// callback, close explicitly. Exactly one closed event fires.
#[tokio::test]
async fn bind_submit_close_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let smsc = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        handle_bind(&mut stream).await;

        let pdu = read_pdu_raw(&mut stream).await;
        let Pdu::SubmitSm(submit) = pdu else {
            panic!("expected submit_sm");
        };
        assert_eq!(submit.message.message().unwrap(), "hello");
        let mut resp = submit.response();
        resp.message_id = "msg-001".into();
        write_pdu_raw(&mut stream, &Pdu::SubmitSmResp(resp)).await;

        drain_until_close(&mut stream).await;
    });

    let observed = Arc::new(Observed::default());
    let session = Session::transceiver(
        TcpDialer,
        auth_for(addr),
        observing_settings(&observed),
        Duration::ZERO,
    )
    .await
    .unwrap();

    assert_eq!(session.system_id(), "MockSMSC");

    session.submit(submit_hello()).await.unwrap();
    wait_for("submit_sm_resp callback", || {
        !observed.pdus.lock().unwrap().is_empty()
    })
    .await;
    assert_eq!(
        observed.pdus.lock().unwrap()[0],
        (CommandId::SubmitSmResp, false)
    );

    session.close().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    // exactly one closed event, and it is the explicit one
    assert_eq!(
        *observed.closed.lock().unwrap(),
        vec![ClosedState::ExplicitClosing]
    );

    // submitting on a closed session fails deterministically
    let err = session.submit(submit_hello()).await.unwrap_err();
    assert!(matches!(err, SmppError::SessionClosing));

    smsc.await.unwrap();
}

// The SMSC initiates unbind; the session acknowledges with the same
// sequence number and reports UnbindClosing promptly.
#[tokio::test]
async fn peer_unbind_is_acknowledged_and_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let smsc = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        handle_bind(&mut stream).await;

        write_pdu_raw(
            &mut stream,
            &Pdu::Unbind(Unbind {
                sequence_number: 42,
            }),
        )
        .await;

        let resp = read_pdu_raw(&mut stream).await;
        assert_eq!(resp.command_id(), CommandId::UnbindResp);
        assert_eq!(resp.sequence_number(), 42);

        drain_until_close(&mut stream).await;
    });

    let observed = Arc::new(Observed::default());
    let session = Session::transceiver(
        TcpDialer,
        auth_for(addr),
        observing_settings(&observed),
        Duration::ZERO,
    )
    .await
    .unwrap();

    wait_for("unbind closed event", || {
        !observed.closed.lock().unwrap().is_empty()
    })
    .await;
    assert_eq!(
        observed.closed.lock().unwrap()[0],
        ClosedState::UnbindClosing
    );

    session.close().await.unwrap();
    smsc.await.unwrap();
}

// After the SMSC drops the connection, the session
// reports the loss, rebinds within the configured interval, and submits
// succeed on the fresh client.
#[tokio::test]
async fn session_rebinds_after_connection_loss() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let smsc = tokio::spawn(async move {
        // first life: bind, then slam the door
        let (mut first, _) = listener.accept().await.unwrap();
        handle_bind(&mut first).await;
        drop(first);

        // second life: bind again and accept a submit
        let (mut second, _) = listener.accept().await.unwrap();
        handle_bind(&mut second).await;
        loop {
            let pdu = read_pdu_raw(&mut second).await;
            if let Pdu::SubmitSm(submit) = pdu {
                write_pdu_raw(&mut second, &Pdu::SubmitSmResp(submit.response())).await;
                break;
            }
            // the writer's close path may have squeezed an unbind in
            // before the drop was noticed; ignore it
        }
        drain_until_close(&mut second).await;
    });

    let observed = Arc::new(Observed::default());
    let session = Session::transceiver(
        TcpDialer,
        auth_for(addr),
        observing_settings(&observed),
        Duration::from_millis(100),
    )
    .await
    .unwrap();

    // the dropped connection surfaces as a reader failure
    wait_for("connection-loss closed event", || {
        !observed.closed.lock().unwrap().is_empty()
    })
    .await;
    assert!(matches!(
        observed.closed.lock().unwrap()[0],
        ClosedState::InvalidStreaming | ClosedState::ConnectionIssue
    ));

    // a submit goes through once the swap lands
    timeout(Duration::from_secs(5), async {
        loop {
            match session.submit(submit_hello()).await {
                Ok(()) => break,
                Err(_) => sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await
    .expect("rebind never produced a usable client");

    wait_for("submit_sm_resp after rebind", || {
        observed
            .pdus
            .lock()
            .unwrap()
            .iter()
            .any(|&(id, _)| id == CommandId::SubmitSmResp)
    })
    .await;

    session.close().await.unwrap();
    smsc.await.unwrap();
}

// A rejected bind surfaces as BindFailed with the SMSC's status.
#[tokio::test]
async fn rejected_bind_reports_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let smsc = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let pdu = read_pdu_raw(&mut stream).await;
        let Pdu::BindRequest(request) = pdu else {
            panic!("expected bind request");
        };
        let mut resp = request.response("");
        resp.command_status = CommandStatus::InvalidPassword;
        write_pdu_raw(&mut stream, &Pdu::BindResponse(resp)).await;
    });

    let err = Session::transceiver(
        TcpDialer,
        auth_for(addr),
        SessionSettings::default(),
        Duration::ZERO,
    )
    .await
    .err()
    .expect("bind should have been rejected");

    assert!(matches!(
        err,
        SmppError::BindFailed(CommandStatus::InvalidPassword)
    ));
    smsc.await.unwrap();
}

// The three bind roles put the right command_id on the wire.
#[tokio::test]
async fn bind_roles_use_their_command_ids() {
    use crate::datatypes::BindType;

    for (bind_type, expected) in [
        (BindType::Receiver, CommandId::BindReceiver),
        (BindType::Transmitter, CommandId::BindTransmitter),
        (BindType::Transceiver, CommandId::BindTransceiver),
    ] {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let smsc = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let pdu = read_pdu_raw(&mut stream).await;
            assert_eq!(pdu.command_id(), expected);
            let Pdu::BindRequest(request) = pdu else {
                unreachable!();
            };
            write_pdu_raw(&mut stream, &Pdu::BindResponse(request.response("MockSMSC"))).await;
            drain_until_close(&mut stream).await;
        });

        let session = Session::new(
            bind_type,
            TcpDialer,
            auth_for(addr),
            SessionSettings {
                read_timeout: Duration::from_secs(30),
                ..Default::default()
            },
            Duration::ZERO,
        )
        .await
        .unwrap();
        session.close().await.unwrap();
        smsc.await.unwrap();
    }
}
