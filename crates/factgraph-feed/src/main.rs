use anyhow::{Context, Result};
use factgraph_feed::load;
use factgraph_model::Session;
use std::path::PathBuf;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: factgraph-feed <facts.json>")?;

    let facts = load::read_facts(&path)?;
    let records = load::processes_from_facts(&facts);

    let mut session = Session::new(800.0, 600.0);
    session.load_processes(&records);
    let root_uid = session
        .hierarchy()
        .root()
        .cloned()
        .context("export carries no root process")?;
    let focal = session
        .hierarchy()
        .get(&root_uid)
        .map(|node| node.process.clone())
        .context("root process missing from hierarchy")?;

    let batch = load::batch_facts(facts);
    let view = session.build_graph(&focal, &batch);

    let tree = session.tree_view();
    tracing::info!(
        export = %path.display(),
        processes = records.len(),
        tree_nodes = tree.visible_nodes.len(),
        graph_nodes = view.nodes.len(),
        graph_links = view.links.len(),
        "loaded sandbox export"
    );

    Ok(())
}
