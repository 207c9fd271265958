use super::*;
use crate::types::ArtifactKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Scripted extractor that counts its invocations
struct Scripted {
    name: &'static str,
    result: fn() -> Result<Vec<Table>, ExtractionError>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(name: &'static str, result: fn() -> Result<Vec<Table>, ExtractionError>) -> Arc<Self> {
        Arc::new(Self {
            name,
            result,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableExtractor for Scripted {
    async fn extract(&self, _pdf: &Path) -> Result<Vec<Table>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn empty() -> Result<Vec<Table>, ExtractionError> {
    Ok(Vec::new())
}

fn failing() -> Result<Vec<Table>, ExtractionError> {
    Err(ExtractionError::StrategyFailed {
        strategy: "scripted",
        reason: "engine crashed".into(),
    })
}

fn boq() -> Result<Vec<Table>, ExtractionError> {
    Ok(vec![
        Table::from_rows([["Item", "Description", "Qty"], ["1", "Mobilization", "1"]]),
        Table::from_rows([["2", "Earthworks", "120"]]),
    ])
}

fn blank_cells() -> Result<Vec<Table>, ExtractionError> {
    Ok(vec![Table::from_rows([["", " "], ["", ""]])])
}

fn attachment(dir: &TempDir) -> CaptureArtifact {
    CaptureArtifact {
        path: dir.path().join("raw").join("10098537_BOQ.pdf"),
        kind: ArtifactKind::Attachment,
    }
}

fn chain(dir: &TempDir, strategies: Vec<Arc<dyn TableExtractor>>) -> ExtractionChain {
    ExtractionChain::new(strategies, dir.path().join("clean"))
}

#[tokio::test]
async fn first_strategy_wins_when_it_finds_tables() {
    let dir = TempDir::new().unwrap();
    let lattice = Scripted::new("lattice", boq);
    let stream = Scripted::new("stream", boq);
    let chain = chain(&dir, vec![lattice.clone() as Arc<dyn TableExtractor>, stream.clone()]);

    let table = chain.run(&attachment(&dir)).await.unwrap();

    assert_eq!(table.strategy, "lattice");
    assert_eq!(lattice.calls(), 1);
    assert_eq!(stream.calls(), 0);
    assert_eq!(table.path, dir.path().join("clean").join("10098537_BOQ.csv"));
    assert_eq!(table.rows, 3);
    assert_eq!(table.columns, 3);
    assert_eq!(
        std::fs::read_to_string(&table.path).unwrap(),
        "Item,Description,Qty\n1,Mobilization,1\n2,Earthworks,120\n"
    );
}

#[tokio::test]
async fn empty_result_falls_back_to_next_strategy() {
    let dir = TempDir::new().unwrap();
    let lattice = Scripted::new("lattice", empty);
    let stream = Scripted::new("stream", boq);
    let chain = chain(&dir, vec![lattice.clone() as Arc<dyn TableExtractor>, stream.clone()]);

    let table = chain.run(&attachment(&dir)).await.unwrap();

    assert_eq!(lattice.calls(), 1);
    assert_eq!(stream.calls(), 1);
    assert_eq!(table.strategy, "stream");
}

#[tokio::test]
async fn failure_falls_back_to_next_strategy() {
    let dir = TempDir::new().unwrap();
    let lattice = Scripted::new("lattice", failing);
    let stream = Scripted::new("stream", boq);
    let chain = chain(&dir, vec![lattice.clone() as Arc<dyn TableExtractor>, stream.clone()]);

    let table = chain.run(&attachment(&dir)).await.unwrap();
    assert_eq!(table.strategy, "stream");
    assert_eq!(stream.calls(), 1);
}

#[tokio::test]
async fn blank_tables_count_as_empty() {
    let dir = TempDir::new().unwrap();
    let lattice = Scripted::new("lattice", blank_cells);
    let stream = Scripted::new("stream", empty);
    let chain = chain(&dir, vec![lattice.clone() as Arc<dyn TableExtractor>, stream.clone()]);

    let result = chain.run(&attachment(&dir)).await;

    assert!(matches!(result, Err(ExtractionError::Exhausted { .. })));
    assert_eq!(stream.calls(), 1);
}

#[tokio::test]
async fn exhausted_chain_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let chain = chain(
        &dir,
        vec![
            Arc::new(NoOpExtractor::new("lattice")) as Arc<dyn TableExtractor>,
            Scripted::new("stream", failing),
        ],
    );

    let result = chain.run(&attachment(&dir)).await;

    assert!(matches!(result, Err(ExtractionError::Exhausted { .. })));
    assert!(!dir.path().join("clean").join("10098537_BOQ.csv").exists());
}

#[tokio::test]
async fn snapshots_are_never_extracted() {
    let dir = TempDir::new().unwrap();
    let lattice = Scripted::new("lattice", boq);
    let chain = chain(&dir, vec![lattice.clone() as Arc<dyn TableExtractor>]);
    let snapshot = CaptureArtifact {
        path: dir.path().join("raw").join("10098537_notice.pdf"),
        kind: ArtifactKind::Snapshot,
    };

    let result = chain.run(&snapshot).await;

    assert!(matches!(result, Err(ExtractionError::NotAnAttachment { .. })));
    assert_eq!(lattice.calls(), 0);
}

#[test]
fn normalize_drops_empty_rows_and_columns() {
    let rows = normalize(vec![
        Table::from_rows([
            vec!["Item", "", "Qty", ""],
            vec!["", "", "", ""],
            vec!["1", "", " 5 ", ""],
        ]),
        Table::from_rows([vec!["2", "", "7"], vec!["  "]]),
    ]);

    assert_eq!(
        rows,
        vec![
            vec!["Item".to_string(), "Qty".to_string()],
            vec!["1".to_string(), "5".to_string()],
            vec!["2".to_string(), "7".to_string()],
        ]
    );
}

#[test]
fn normalize_pads_ragged_rows() {
    let rows = normalize(vec![Table::from_rows([vec!["a", "b", "c"], vec!["d"]])]);
    assert_eq!(rows[1], vec!["d".to_string(), String::new(), String::new()]);
}

#[test]
fn normalize_of_nothing_is_empty() {
    assert!(normalize(Vec::new()).is_empty());
}

#[test]
fn from_tools_keeps_two_slots_when_engines_missing() {
    let tools = ToolsConfig {
        search_path: false,
        ..ToolsConfig::default()
    };
    let chain = ExtractionChain::from_tools(&tools, PathBuf::from("clean"));
    assert_eq!(chain.strategy_names(), vec!["tabula-lattice", "layout-stream"]);
}
