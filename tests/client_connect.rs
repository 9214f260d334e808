//! End-to-end client tests against an in-process server.
//!
//! A minimal scripted IRC server accepts one connection, walks the
//! registration exchange, and then follows the client through PING,
//! PRIVMSG, and QUIT.

#![cfg(feature = "tokio")]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use slirc_client::client::{Client, ClientConfig};
use slirc_client::endpoint::ServerEndpoint;
use slirc_client::event::Event;
use slirc_client::session::registration::{RegistrationInfo, UserRegistration};
use slirc_client::session::RegistrationState;
use slirc_client::transport::TlsOptions;

const STEP: Duration = Duration::from_secs(10);

async fn next_event(events: &mut slirc_client::client::EventReceiver) -> Event {
    tokio::time::timeout(STEP, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn test_config() -> ClientConfig {
    ClientConfig::new(RegistrationInfo::User(UserRegistration::simple("tester")))
}

#[tokio::test]
async fn connect_register_ping_and_quit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let nick_line = lines.next_line().await.unwrap().unwrap();
        assert!(nick_line.starts_with("NICK"), "got {:?}", nick_line);
        let user_line = lines.next_line().await.unwrap().unwrap();
        assert!(user_line.starts_with("USER"), "got {:?}", user_line);

        write
            .write_all(b":test.server 001 tester :Welcome to the test network\r\n")
            .await
            .unwrap();
        write.write_all(b"PING :check\r\n").await.unwrap();

        // The automatic PONG must carry our token.
        loop {
            let line = lines.next_line().await.unwrap().unwrap();
            if line.starts_with("PONG") {
                assert!(line.contains("check"), "got {:?}", line);
                break;
            }
        }

        // Follow the client through its goodbye.
        loop {
            match lines.next_line().await.unwrap() {
                Some(line) if line.starts_with("QUIT") => break,
                Some(_) => continue,
                None => return,
            }
        }
        let _ = write
            .write_all(b"ERROR :Closing Link: tester (Quit: done)\r\n")
            .await;
    });

    let (client, mut events) = Client::new(test_config());
    client
        .connect(
            ServerEndpoint::new("127.0.0.1", addr.port(), false),
            TlsOptions::default(),
        )
        .unwrap();

    assert!(matches!(next_event(&mut events).await, Event::Connecting));
    assert!(matches!(next_event(&mut events).await, Event::Connected));

    let mut saw_ping = false;
    loop {
        match next_event(&mut events).await {
            Event::Registered { nick } => {
                assert_eq!(nick, "tester");
                assert_eq!(client.state(), RegistrationState::Registered);
            }
            Event::PingReceived { token } => {
                assert_eq!(token, "check");
                saw_ping = true;
                client.quit(Some("done"), Duration::from_secs(5)).await.unwrap();
            }
            Event::Disconnected => break,
            _ => {}
        }
    }
    assert!(saw_ping);
    assert_eq!(client.state(), RegistrationState::Disconnected);

    tokio::time::timeout(STEP, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn raw_sends_report_tokens_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            if line.starts_with("USER") {
                break;
            }
        }
        write
            .write_all(b":test.server 001 tester :Welcome\r\n")
            .await
            .unwrap();
        // Keep reading until the peer goes away.
        while lines.next_line().await.unwrap().is_some() {}
    });

    let (client, mut events) = Client::new(test_config());
    client
        .connect(
            ServerEndpoint::new("127.0.0.1", addr.port(), false),
            TlsOptions::default(),
        )
        .unwrap();

    loop {
        if matches!(next_event(&mut events).await, Event::Registered { .. }) {
            break;
        }
    }

    let first = client.send_raw("PING :one").unwrap();
    let second = client.send_raw("PING :two").unwrap();
    assert!(first < second);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        if let Event::RawMessageSent { token } = next_event(&mut events).await {
            if token == first || token == second {
                seen.push(token);
            }
        }
    }
    assert_eq!(seen, vec![first, second]);

    client.quit(None, Duration::from_millis(200)).await.unwrap();
    tokio::time::timeout(STEP, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn connect_failure_surfaces_event() {
    // Grab a port with no listener behind it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (client, mut events) = Client::new(test_config());
    client
        .connect(
            ServerEndpoint::new("127.0.0.1", addr.port(), false),
            TlsOptions::default(),
        )
        .unwrap();

    assert!(matches!(next_event(&mut events).await, Event::Connecting));
    assert!(matches!(
        next_event(&mut events).await,
        Event::ConnectFailed { .. }
    ));
    assert_eq!(client.state(), RegistrationState::Disconnected);

    // The client can try again from scratch.
    assert!(client
        .connect(
            ServerEndpoint::new("127.0.0.1", addr.port(), false),
            TlsOptions::default(),
        )
        .is_ok());
    assert!(matches!(next_event(&mut events).await, Event::Connecting));
    assert!(matches!(
        next_event(&mut events).await,
        Event::ConnectFailed { .. }
    ));
}

#[tokio::test]
async fn commands_fail_before_registration() {
    let (client, _events) = Client::new(test_config());
    assert!(client.join(&["#chan"], &[]).is_err());
    assert!(client.send_private_message(&["#chan"], "hi").is_err());
}
