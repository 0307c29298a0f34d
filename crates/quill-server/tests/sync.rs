//! End-to-end tests over a real WebSocket server on loopback.

use quill_server::{ClientEvent, ServerEvent, SyncClient, SyncServer, SyncServerConfig};
use quill_store::{NoteService, NoteStore};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// Binds an ephemeral port, spawns the server on it, and returns the
/// connect URL. The temp dir keeps the sled store alive for the test.
async fn start_server() -> (String, TempDir) {
    let dir = tempdir().unwrap();
    let store = NoteStore::open(dir.path()).unwrap();
    let server = SyncServer::new(NoteService::new(store), SyncServerConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    (format!("ws://{addr}"), dir)
}

async fn recv(client: &mut SyncClient) -> ServerEvent {
    timeout(Duration::from_secs(5), client.next_event())
        .await
        .expect("timed out waiting for server event")
        .expect("client error")
        .expect("connection closed")
}

async fn create_note(client: &mut SyncClient) -> quill_core::Note {
    client
        .send(&ClientEvent::NoteCreate { title: None })
        .await
        .unwrap();
    match recv(client).await {
        ServerEvent::Note(note) => note,
        other => panic!("expected note, got {other:?}"),
    }
}

#[tokio::test]
async fn presence_edit_and_cursor_flow() {
    let (url, _dir) = start_server().await;

    let mut alice = SyncClient::connect(&url).await.unwrap();
    let note = create_note(&mut alice).await;

    alice.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(1)));

    let mut bob = SyncClient::connect(&url).await.unwrap();
    bob.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut bob).await, ServerEvent::ActiveUsers(2)));
    // the join is observed by everyone already in the room too
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(2)));

    // edit relays to the peer, acks the sender, never echoes back
    alice.edit(&note.id, "a").await.unwrap();
    match recv(&mut bob).await {
        ServerEvent::NoteUpdate(content) => assert_eq!(content, "a"),
        other => panic!("expected note_update, got {other:?}"),
    }
    assert!(matches!(recv(&mut alice).await, ServerEvent::LastSaved(_)));

    // cursors relay fire-and-forget to the peer only
    alice.cursor(&note.id, 1).await.unwrap();
    match recv(&mut bob).await {
        ServerEvent::CursorPosition { cursor, .. } => assert_eq!(cursor, 1),
        other => panic!("expected cursor_position, got {other:?}"),
    }

    // disconnect drops the count back down for the survivor
    bob.close().await.unwrap();
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(1)));
}

#[tokio::test]
async fn abrupt_disconnect_still_updates_presence() {
    let (url, _dir) = start_server().await;

    let mut alice = SyncClient::connect(&url).await.unwrap();
    let note = create_note(&mut alice).await;
    alice.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(1)));

    let mut bob = SyncClient::connect(&url).await.unwrap();
    bob.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut bob).await, ServerEvent::ActiveUsers(2)));
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(2)));

    // bob's socket dies without a closing handshake; membership must
    // still be torn down and the survivor told
    drop(bob);
    assert!(matches!(recv(&mut alice).await, ServerEvent::ActiveUsers(1)));
}

#[tokio::test]
async fn concurrent_joins_announce_counts_in_order() {
    let (url, _dir) = start_server().await;

    let mut first = SyncClient::connect(&url).await.unwrap();
    let note = create_note(&mut first).await;
    first.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut first).await, ServerEvent::ActiveUsers(1)));

    // four more connections join at once; while the room only grows,
    // no subscriber may ever observe the count going backwards
    let mut tasks = Vec::new();
    for _ in 0..4 {
        let url = url.clone();
        let id = note.id.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = SyncClient::connect(&url).await.unwrap();
            client.join(&id).await.unwrap();
            let mut last = 0;
            loop {
                match recv(&mut client).await {
                    ServerEvent::ActiveUsers(count) => {
                        assert!(count >= last, "presence went backwards: {count} after {last}");
                        last = count;
                        if count == 5 {
                            break;
                        }
                    }
                    other => panic!("expected active_users, got {other:?}"),
                }
            }
            // keep the connection open until every task has observed 5
            client
        }));
    }

    let mut clients = Vec::new();
    for task in tasks {
        clients.push(task.await.unwrap());
    }

    let mut last = 1;
    loop {
        match recv(&mut first).await {
            ServerEvent::ActiveUsers(count) => {
                assert!(count >= last, "presence went backwards: {count} after {last}");
                last = count;
                if count == 5 {
                    break;
                }
            }
            other => panic!("expected active_users, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn restore_appends_pre_restore_snapshot() {
    let (url, _dir) = start_server().await;

    let mut client = SyncClient::connect(&url).await.unwrap();
    let note = create_note(&mut client).await;

    client.join(&note.id).await.unwrap();
    assert!(matches!(recv(&mut client).await, ServerEvent::ActiveUsers(1)));

    client.edit(&note.id, "a").await.unwrap();
    assert!(matches!(recv(&mut client).await, ServerEvent::LastSaved(_)));
    client.edit(&note.id, "ab").await.unwrap();
    assert!(matches!(recv(&mut client).await, ServerEvent::LastSaved(_)));

    // newest version is the state before "ab", i.e. "a"
    client
        .send(&ClientEvent::NoteVersions {
            note_id: note.id.clone(),
        })
        .await
        .unwrap();
    let versions = match recv(&mut client).await {
        ServerEvent::Versions(v) => v,
        other => panic!("expected versions, got {other:?}"),
    };
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].content, "a");

    client.restore(&note.id, versions[0].timestamp).await.unwrap();
    let restored = match recv(&mut client).await {
        ServerEvent::Note(n) => n,
        other => panic!("expected note, got {other:?}"),
    };
    assert_eq!(restored.content, "a");
    // the pre-restore live content "ab" was snapshotted on top
    assert_eq!(restored.versions.last().unwrap().content, "ab");
    assert_eq!(restored.versions.len(), 3);
}

#[tokio::test]
async fn live_edit_for_missing_note_is_dropped_silently() {
    let (url, _dir) = start_server().await;

    let mut client = SyncClient::connect(&url).await.unwrap();
    client.join("ghost").await.unwrap();
    assert!(matches!(recv(&mut client).await, ServerEvent::ActiveUsers(1)));

    client.edit("ghost", "into the void").await.unwrap();

    // no ack and no error: the next event is the reply to a follow-up
    // request, proving the edit produced nothing
    client.send(&ClientEvent::NoteList).await.unwrap();
    match recv(&mut client).await {
        ServerEvent::NoteList(notes) => assert!(notes.is_empty()),
        other => panic!("expected note_list, got {other:?}"),
    }
}

#[tokio::test]
async fn request_path_surfaces_not_found() {
    let (url, _dir) = start_server().await;

    let mut client = SyncClient::connect(&url).await.unwrap();
    client
        .send(&ClientEvent::NoteGet {
            note_id: "missing".into(),
        })
        .await
        .unwrap();
    match recv(&mut client).await {
        ServerEvent::Error { message } => assert!(message.contains("Note not found")),
        other => panic!("expected error, got {other:?}"),
    }

    let note = create_note(&mut client).await;
    client.restore(&note.id, chrono::Utc::now()).await.unwrap();
    match recv(&mut client).await {
        ServerEvent::Error { message } => assert!(message.contains("Version not found")),
        other => panic!("expected error, got {other:?}"),
    }
}
