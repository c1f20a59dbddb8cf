use std::collections::HashMap;
use std::path::PathBuf;

use blendinfo::blend::{BlendFile, IdGraph, IdGraphNode, IdGraphOptions, IdGraphTruncation, Result, build_id_graph};

use crate::cmd::util::{dot_escape, emit_json, print_warnings, ptr_hex, render_code, warning_strings};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Emit Graphviz instead of text.
	#[arg(long, conflicts_with = "json")]
	pub dot: bool,
	/// Emit JSON.
	#[arg(long)]
	pub json: bool,
	/// Stop after this many edges.
	#[arg(long)]
	pub max_edges: Option<usize>,
	/// Drop edges from a block to itself.
	#[arg(long)]
	pub no_self: bool,
}

/// Build and print the whole-file ID-to-ID graph.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		dot,
		json,
		max_edges,
		no_self,
	} = args;

	let mut blend = BlendFile::open(&path)?;
	let dna = blend.dna()?;

	let mut options = IdGraphOptions::default();
	if let Some(max_edges) = max_edges {
		options.max_edges = max_edges;
	}
	options.include_self = !no_self;

	let graph = build_id_graph(&mut blend, &dna, &options)?;

	if json {
		return print_json(&path, &graph);
	}
	if dot {
		print_dot(&graph);
		return Ok(());
	}

	print_text(&path, &graph);
	Ok(())
}

fn print_text(path: &std::path::Path, graph: &IdGraph) {
	println!("path: {}", path.display());
	println!("nodes: {}", graph.nodes.len());
	println!("edges: {}", graph.edges.len());
	println!("truncated: {}", truncation_value(graph.truncated).unwrap_or("none"));

	let by_ptr: HashMap<u64, _> = graph.nodes.iter().map(|node| (node.old, node)).collect();
	for edge in &graph.edges {
		let from = by_ptr.get(&edge.from).copied();
		let to = by_ptr.get(&edge.to).copied();
		println!("{} -{}-> {}", node_label(from), edge.path, node_label(to));
	}
	print_warnings(&graph.warnings);
}

fn print_dot(graph: &IdGraph) {
	println!("digraph blendinfo_idgraph {{");
	for node in &graph.nodes {
		let label = format!("{}\\n{}", node.id_name.as_deref().unwrap_or("?"), node.type_name);
		println!("  \"{}\" [label=\"{}\"]", ptr_hex(node.old), dot_escape(&label));
	}
	for edge in &graph.edges {
		println!("  \"{}\" -> \"{}\" [label=\"{}\"]", ptr_hex(edge.from), ptr_hex(edge.to), dot_escape(&edge.path));
	}
	println!("}}");
}

fn print_json(path: &std::path::Path, graph: &IdGraph) -> Result<()> {
	let payload = GraphJson {
		path: path.display().to_string(),
		truncated: truncation_value(graph.truncated),
		nodes: graph
			.nodes
			.iter()
			.map(|node| GraphNodeJson {
				old: ptr_hex(node.old),
				code: render_code(node.code),
				sdna_nr: node.sdna_nr,
				type_name: node.type_name.to_string(),
				id: node.id_name.as_deref().map(str::to_owned),
			})
			.collect(),
		edges: graph
			.edges
			.iter()
			.map(|edge| GraphEdgeJson {
				from: ptr_hex(edge.from),
				to: ptr_hex(edge.to),
				field: edge.field.to_string(),
				path: edge.path.to_string(),
			})
			.collect(),
		warnings: warning_strings(&graph.warnings),
	};
	emit_json(&payload)
}

fn node_label(node: Option<&IdGraphNode>) -> String {
	let Some(node) = node else {
		return "<unknown>".to_owned();
	};
	format!("{}({})", node.id_name.as_deref().unwrap_or("?"), node.type_name)
}

fn truncation_value(value: Option<IdGraphTruncation>) -> Option<&'static str> {
	match value {
		Some(IdGraphTruncation::MaxEdges) => Some("max_edges"),
		None => None,
	}
}

#[derive(serde::Serialize)]
struct GraphJson {
	path: String,
	truncated: Option<&'static str>,
	nodes: Vec<GraphNodeJson>,
	edges: Vec<GraphEdgeJson>,
	warnings: Vec<String>,
}

#[derive(serde::Serialize)]
struct GraphNodeJson {
	old: String,
	code: String,
	sdna_nr: u32,
	#[serde(rename = "type")]
	type_name: String,
	id: Option<String>,
}

#[derive(serde::Serialize)]
struct GraphEdgeJson {
	from: String,
	to: String,
	field: String,
	path: String,
}
