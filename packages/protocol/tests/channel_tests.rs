use sitecanvas_protocol::{pair, DeleteKind, EditorEvent, HostCommand};

#[tokio::test]
async fn test_messages_flow_both_ways() {
    let (editor, mut host) = pair();
    let (editor_tx, mut editor_rx) = editor.split();

    editor_tx
        .send(&EditorEvent::Delete {
            key: "hero_p_2".to_string(),
            kind: DeleteKind::Text,
        })
        .unwrap();
    host.send(&HostCommand::ResetSection {
        section_id: "section_1".to_string(),
    })
    .unwrap();

    assert_eq!(
        host.recv().await,
        Some(EditorEvent::Delete {
            key: "hero_p_2".to_string(),
            kind: DeleteKind::Text,
        })
    );
    assert_eq!(
        editor_rx.recv().await,
        Some(HostCommand::ResetSection {
            section_id: "section_1".to_string()
        })
    );
}

#[tokio::test]
async fn test_malformed_messages_are_skipped() {
    let (editor, mut host) = pair();

    editor.sender.send_raw("{{{").unwrap();
    editor.sender.send_raw(r#"{"type":"telemetry","data":1}"#).unwrap();
    editor
        .send(&EditorEvent::SectionReset {
            section_id: "section_3".to_string(),
        })
        .unwrap();

    assert_eq!(
        host.recv().await,
        Some(EditorEvent::SectionReset {
            section_id: "section_3".to_string()
        })
    );
    assert_eq!(host.try_recv(), None);
}

#[tokio::test]
async fn test_recv_ends_when_peer_dropped() {
    let (editor, mut host) = pair();
    drop(editor);
    assert_eq!(host.recv().await, None);
    assert!(host
        .send(&HostCommand::DeleteSection {
            section_id: "section_1".to_string()
        })
        .is_err());
}
