//! Integration tests for the SMTP client.
//!
//! Each test runs a scripted server on a loopback socket and drives the
//! client through a real TCP connection.

#![allow(clippy::unwrap_used)]

use mailshot_smtp::connection::connect;
use mailshot_smtp::{Address, Client, Error, SmtpConnection, TlsVerification};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One exchange: the command prefix the client must send and the reply.
type Step = (&'static str, &'static str);

/// Starts a server that greets, then answers `script` in order.
///
/// After a `DATA` step the server collects content up to the lone `.` line
/// and records it as a single transcript entry, then answers with the next
/// step's reply (whose prefix must be `.`).
async fn scripted_server(script: Vec<Step>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut transcript = Vec::new();

        write
            .write_all(b"220 test.local ESMTP ready\r\n")
            .await
            .unwrap();

        let mut in_data = false;
        for (expected, reply) in script {
            let received = if in_data {
                let mut content = String::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).await.unwrap();
                    if line == ".\r\n" {
                        break;
                    }
                    content.push_str(&line);
                }
                in_data = false;
                transcript.push(content);
                ".".to_string()
            } else {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let line = line.trim_end().to_string();
                transcript.push(line.clone());
                line
            };

            assert!(
                received.starts_with(expected),
                "expected {expected:?}, got {received:?}"
            );
            if expected == "DATA" {
                in_data = true;
            }
            write.write_all(reply.as_bytes()).await.unwrap();
        }

        transcript
    });

    (port, handle)
}

#[tokio::test]
async fn full_session_with_auth_plain() {
    let (port, server) = scripted_server(vec![
        (
            "EHLO localhost",
            "250-test.local\r\n250-SIZE 1000000\r\n250 AUTH PLAIN LOGIN\r\n",
        ),
        ("AUTH PLAIN", "235 2.7.0 Authentication successful\r\n"),
        ("MAIL FROM:<a@x.com>", "250 OK\r\n"),
        ("RCPT TO:<b@x.com>", "250 OK\r\n"),
        ("RCPT TO:<c@x.com>", "250 OK\r\n"),
        ("DATA", "354 End data with <CR><LF>.<CR><LF>\r\n"),
        (".", "250 OK queued\r\n"),
        ("QUIT", "221 Bye\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    assert_eq!(client.server_info().hostname, "test.local");

    let client = client.ehlo("localhost").await.unwrap();
    assert!(!client.server_info().supports_starttls());
    assert!(!client.is_encrypted());

    let client = client.authenticate("a@x.com", "secret").await.unwrap();
    let client = client
        .mail_from(Address::new("a@x.com").unwrap())
        .await
        .unwrap();
    let client = client
        .rcpt_to(Address::new("b@x.com").unwrap())
        .await
        .unwrap();
    let client = client
        .rcpt_to(Address::new("c@x.com").unwrap())
        .await
        .unwrap();
    let client = client.data().await.unwrap();
    let client = client
        .send_message(b"Subject: Hello\r\n\r\n.leading dot\r\n")
        .await
        .unwrap();
    client.quit().await.unwrap();

    let transcript = server.await.unwrap();
    // base64("\0a@x.com\0secret")
    assert_eq!(transcript[1], "AUTH PLAIN AGFAeC5jb20Ac2VjcmV0");
    assert_eq!(transcript[6], "Subject: Hello\r\n\r\n..leading dot\r\n");
    assert_eq!(transcript.last().unwrap(), "QUIT");
}

#[tokio::test]
async fn auth_login_when_plain_not_offered() {
    let (port, server) = scripted_server(vec![
        ("EHLO localhost", "250-test.local\r\n250 AUTH LOGIN\r\n"),
        ("AUTH LOGIN", "334 VXNlcm5hbWU6\r\n"),
        ("dXNlcg==", "334 UGFzc3dvcmQ6\r\n"),
        ("cGFzcw==", "235 OK\r\n"),
        ("QUIT", "221 Bye\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let client = client.authenticate("user", "pass").await.unwrap();
    client.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.len(), 5);
}

#[tokio::test]
async fn rejected_recipient_aborts_transaction() {
    let (port, server) = scripted_server(vec![
        ("EHLO localhost", "250 test.local\r\n"),
        ("MAIL FROM:<a@x.com>", "250 OK\r\n"),
        ("RCPT TO:<nobody@x.com>", "550 5.1.1 No such user\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let client = client
        .mail_from(Address::new("a@x.com").unwrap())
        .await
        .unwrap();
    let err = client
        .rcpt_to(Address::new("nobody@x.com").unwrap())
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert!(err.to_string().contains("No such user"));

    let transcript = server.await.unwrap();
    assert!(!transcript.iter().any(|line| line == "DATA"));
}

#[tokio::test]
async fn rejected_credentials() {
    let (port, _server) = scripted_server(vec![
        ("EHLO localhost", "250-test.local\r\n250 AUTH PLAIN\r\n"),
        ("AUTH PLAIN", "535 5.7.8 Authentication credentials invalid\r\n"),
    ])
    .await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let err = client.auth_plain("user", "wrong").await.unwrap_err();

    assert!(matches!(err, Error::SmtpError { code: 535, .. }));
}

#[tokio::test]
async fn starttls_requires_advertisement() {
    let (port, _server) = scripted_server(vec![("EHLO localhost", "250 test.local\r\n")]).await;

    let stream = connect("127.0.0.1", port).await.unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let err = client
        .starttls("127.0.0.1", "localhost", TlsVerification::Insecure)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotSupported(_)));
}
