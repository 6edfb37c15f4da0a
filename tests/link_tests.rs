mod common;

use common::{controlled_loader, ready_loader};
use termshim::{HyperlinkSpan, LinkDetector, LinkKind, Terminal, TerminalOptions};

#[tokio::test]
async fn test_links_from_live_terminal() {
    let (record, load) = ready_loader();
    {
        let mut record = record.lock();
        record
            .rows
            .insert(0, "X docs at https://x.com, see above".to_string());
        record.hyperlinks.insert(
            0,
            vec![HyperlinkSpan {
                start_col: 0,
                end_col: 0,
                uri: "https://explicit.example/x".to_string(),
            }],
        );
    }
    let terminal = Terminal::new(TerminalOptions::default(), load).unwrap();
    terminal.wait_ready().await.unwrap();

    let links = LinkDetector::new().links_for_row(&terminal, 0);
    assert_eq!(links.len(), 2);

    assert_eq!(links[0].kind, LinkKind::Hyperlink);
    assert_eq!(links[0].text, "X");
    assert_eq!(links[0].uri, "https://explicit.example/x");

    assert_eq!(links[1].kind, LinkKind::Url);
    assert_eq!(links[1].text, "https://x.com");
    assert_eq!((links[1].start_col, links[1].end_col), (10, 22));
}

#[tokio::test]
async fn test_no_links_before_ready() {
    let (_control, load) = controlled_loader();
    let terminal = Terminal::new(TerminalOptions::default(), load).unwrap();

    let detector = LinkDetector::new();
    assert!(detector.links_for_row(&terminal, 0).is_empty());
    assert!(detector.link_at(&terminal, 0, 0).is_none());
}

#[tokio::test]
async fn test_link_at_on_terminal_row() {
    let (record, load) = ready_loader();
    record
        .lock()
        .rows
        .insert(3, "error: see https://example.com/E0382.".to_string());
    let terminal = Terminal::new(TerminalOptions::default(), load).unwrap();
    terminal.wait_ready().await.unwrap();

    let detector = LinkDetector::new();
    let link = detector.link_at(&terminal, 3, 20).unwrap();
    assert_eq!(link.text, "https://example.com/E0382");
    assert_eq!(link.row, 3);
    assert!(detector.link_at(&terminal, 3, 36).is_none());
    assert!(detector.link_at(&terminal, 2, 20).is_none());
}
