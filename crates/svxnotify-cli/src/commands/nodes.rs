use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use svxnotify_core::{is_hidden, CoreError, FeedClient, Node, Result};

use super::{load_config, runtime};

#[derive(Serialize)]
struct NodeListing {
    #[serde(flatten)]
    node: Node,
    hidden: bool,
}

pub fn run(config_path: Option<&Path>, json: bool, all: bool) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let feed = FeedClient::new(&config.feed)?;
    let body = runtime()?.block_on(feed.fetch())?;
    let document: Value = serde_json::from_str(&body)?;

    let nodes = document
        .get("nodes")
        .and_then(Value::as_object)
        .ok_or_else(|| CoreError::Custom("feed response has no nodes mapping".into()))?;

    let mut listings = Vec::new();
    for (name, raw) in nodes {
        let hidden = is_hidden(raw);
        if hidden && !all {
            continue;
        }
        match Node::from_json(name, raw) {
            Ok(node) => listings.push(NodeListing { node, hidden }),
            Err(e) => eprintln!("skipping: {e}"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    println!("{:<12} {:<24} {:<8} {:<8} MONITORING", "NODE", "LOCATION", "TALKING", "TG");
    for NodeListing { node, hidden } in &listings {
        let tg = node.talk_group.map(|tg| tg.to_string()).unwrap_or_else(|| "-".into());
        let monitoring = node
            .monitoring_talkgroups
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let name = if *hidden {
            format!("{}*", node.name)
        } else {
            node.name.clone()
        };
        println!(
            "{:<12} {:<24} {:<8} {:<8} {}",
            name,
            node.location,
            if node.is_talking { "yes" } else { "no" },
            tg,
            monitoring
        );
    }
    Ok(())
}
