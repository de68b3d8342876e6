//! The async driver against a live channel, on a paused clock

use sitecanvas_editor::{run_session, EditorConfig, RenderSession, UserAction};
use sitecanvas_protocol::{pair, EditorEvent, GeneratedText, HostCommand, HostEndpoint};
use tokio::sync::mpsc;

const PAGE: &str = r#"<body>
  <section class="intro">
    <h1>Hello there</h1>
    <p>Some words.</p>
  </section>
</body>"#;

fn session() -> RenderSession {
    let mut session = RenderSession::new("intro", EditorConfig::default());
    session.load(PAGE).unwrap();
    session
}

async fn next(host: &mut HostEndpoint) -> EditorEvent {
    host.recv().await.expect("editor hung up")
}

fn edit(key: &str, html: &str) -> UserAction {
    UserAction::EditText {
        key: key.to_string(),
        html: html.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_edits_debounced_into_one_snapshot() {
    let (editor, mut host) = pair();
    let (actions, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_session(session(), editor, rx));

    assert!(matches!(next(&mut host).await, EditorEvent::Ready { .. }));
    assert!(matches!(next(&mut host).await, EditorEvent::Layers { .. }));

    actions.send(edit("intro_h1_1", "Hi")).unwrap();
    actions.send(edit("intro_h1_1", "Hi again")).unwrap();
    assert!(matches!(next(&mut host).await, EditorEvent::Edit { .. }));
    assert!(matches!(next(&mut host).await, EditorEvent::Edit { .. }));

    match next(&mut host).await {
        EditorEvent::FullSnapshot { html, revision } => {
            assert_eq!(revision, 1);
            assert!(html.contains("<h1>Hi again</h1>"));
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
    assert!(matches!(next(&mut host).await, EditorEvent::Layers { .. }));

    drop(actions);
    let session = handle.await.unwrap();
    assert_eq!(session.revision(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_lets_the_debounce_fire() {
    let (editor, mut host) = pair();
    let (actions, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_session(session(), editor, rx));
    next(&mut host).await;
    next(&mut host).await;

    actions.send(edit("intro_p_2", "First")).unwrap();
    actions.send(UserAction::Wait { ms: 1000 }).unwrap();
    actions.send(edit("intro_p_2", "Second")).unwrap();
    drop(actions);

    let mut revisions = Vec::new();
    while let Some(event) = host.recv().await {
        if let EditorEvent::FullSnapshot { html, revision } = event {
            revisions.push((revision, html.contains("<p>Second</p>")));
        }
        if revisions.len() == 2 {
            break;
        }
    }
    assert_eq!(revisions, vec![(1, false), (2, true)]);
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_generation_round_trip() {
    let (editor, mut host) = pair();
    let (actions, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_session(session(), editor, rx));
    next(&mut host).await;
    next(&mut host).await;

    actions
        .send(UserAction::GenerateText {
            key: "intro_p_2".to_string(),
        })
        .unwrap();
    drop(actions);

    let EditorEvent::GenerateRequest {
        request_id,
        scope,
        inventory,
    } = next(&mut host).await
    else {
        panic!("expected a generate request");
    };
    assert_eq!(inventory.len(), 1);

    host.send(&HostCommand::ApplyGeneratedContent {
        request_id,
        target: scope,
        items: vec![GeneratedText {
            key: "intro_p_2".to_string(),
            text: "Freshly written.".to_string(),
        }],
        error: false,
    })
    .unwrap();

    assert!(matches!(next(&mut host).await, EditorEvent::Edit { .. }));
    assert!(matches!(next(&mut host).await, EditorEvent::FullSnapshot { revision: 1, .. }));

    let session = handle.await.unwrap();
    assert_eq!(session.text_of("intro_p_2").as_deref(), Some("Freshly written."));
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_driver_stops_when_host_leaves() {
    let (editor, host) = pair();
    let (_actions, rx) = mpsc::unbounded_channel::<UserAction>();
    drop(host);

    let session = run_session(session(), editor, rx).await;
    assert!(session.is_ready());
}
