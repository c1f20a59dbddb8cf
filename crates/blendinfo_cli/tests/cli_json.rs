#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};

use blendinfo_testkit::fixtures::{id_library, int_ptr_pair};
use blendinfo_testkit::write_temp;

fn run_blendinfo(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_blendinfo"))
		.args(args)
		.output()
		.expect("blendinfo command executes")
}

fn run_blendinfo_json(args: &[&str]) -> serde_json::Value {
	let output = run_blendinfo(args);
	assert!(
		output.status.success(),
		"blendinfo command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn path_arg(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

#[test]
fn info_reports_header_facts() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());
	let json = run_blendinfo_json(&["info", &path, "--json"]);

	assert_eq!(json["pointer_size"], 4);
	assert_eq!(json["endianness"], "little");
	assert_eq!(json["version_number"], 279);
	assert_eq!(json["block_count"], 2);
	assert_eq!(json["has_endb"], true);
	assert_eq!(json["last_code"], "DNA1");
}

#[test]
fn dna_lists_one_struct_layout() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());
	let json = run_blendinfo_json(&["dna", &path, "--struct", "Pair", "--json"]);

	let structs = json["structs"].as_array().expect("structs array");
	assert_eq!(structs.len(), 1);
	assert_eq!(structs[0]["sdna_nr"], 1);
	assert_eq!(structs[0]["size"], 8);
	assert_eq!(structs[0]["fields"][1]["decl"], "*next");
	assert_eq!(structs[0]["fields"][1]["offset"], 4);
	assert_eq!(structs[0]["fields"][1]["pointer"], true);
}

#[test]
fn unknown_struct_fails_with_error_line() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());
	let output = run_blendinfo(&["dna", &path, "--struct", "Nope"]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: DNA struct not found: Nope"), "stderr was {stderr}");
}

#[test]
fn dump_reports_two_pair_elements() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());
	let json = run_blendinfo_json(&["dump", &path, "--json"]);

	let blocks = json["blocks"].as_array().expect("blocks array");
	assert_eq!(blocks[0]["type"], "Pair");
	let elements = blocks[0]["elements"].as_array().expect("elements array");
	assert_eq!(elements.len(), 2);
	assert_eq!(elements[0]["fields"][0]["value"], 7);
	assert_eq!(elements[0]["fields"][1]["value"], "0x0000000000001008");
	assert!(blocks[1]["preview"].as_str().is_some_and(|item| item.starts_with("53444e41")));
}

#[test]
fn graph_and_locate_on_id_library() {
	let file = write_temp(&id_library(8, false));
	let path = path_arg(file.path());

	let graph = run_blendinfo_json(&["graph", &path, "--json"]);
	assert_eq!(graph["nodes"].as_array().map(Vec::len), Some(2));
	assert_eq!(graph["edges"][0]["field"], "data");
	assert_eq!(graph["edges"][1]["field"], "next");
	assert_eq!(graph["edges"][1]["path"], "id.next");
	assert!(graph["truncated"].is_null());

	let locate = run_blendinfo_json(&["locate", &path, "0x3010", "--json"]);
	let hit = &locate["hits"][0];
	assert_eq!(hit["block_offset"], 16);
	assert_eq!(hit["element"]["type"], "Vert");
	assert_eq!(hit["element"]["index"], 1);
	assert_eq!(hit["element"]["element_offset"], 0);
}

#[test]
fn ids_and_stats_summaries() {
	let file = write_temp(&id_library(4, true));
	let path = path_arg(file.path());

	let ids = run_blendinfo_json(&["ids", &path, "--json"]);
	assert_eq!(ids["id_blocks"], 2);
	assert_eq!(ids["total_blocks"], 5);
	assert!(ids["warnings"].as_array().is_some_and(Vec::is_empty));

	let stats = run_blendinfo_json(&["stats", &path, "--json"]);
	let entries = stats["entries"].as_array().expect("entries array");
	let bytes: Vec<u64> = entries.iter().filter_map(|entry| entry["bytes"].as_u64()).collect();
	assert!(bytes.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn strip_round_trip_restores_original_bytes() {
	let original = id_library(8, false);
	let file = write_temp(&original);
	let path = path_arg(file.path());
	let side = tempfile::NamedTempFile::new().expect("side file creates");
	let side_path = path_arg(side.path());

	let zeroed = run_blendinfo_json(&["strip", &path, "--zero", "--extract-to", &side_path, "--json"]);
	assert_eq!(zeroed["mode"], "swap");
	assert_eq!(zeroed["header_pointers"], 5);
	assert_eq!(zeroed["field_pointers"], 6);
	assert_ne!(std::fs::read(file.path()).expect("reads stripped"), original);
	assert_eq!(std::fs::read(side.path()).expect("reads side").len(), 11 * 8);

	let restored = run_blendinfo_json(&["strip", &path, "--restore-from", &side_path, "--json"]);
	assert_eq!(restored["mode"], "restore");
	assert_eq!(std::fs::read(file.path()).expect("reads restored"), original);
}

#[test]
fn strip_requires_a_mode_and_rejects_zero_with_restore() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());

	assert!(!run_blendinfo(&["strip", &path]).status.success());
	assert!(!run_blendinfo(&["strip", &path, "--zero", "--restore-from", &path]).status.success());
	assert_eq!(std::fs::read(file.path()).expect("reads back"), int_ptr_pair());
}

#[test]
fn strip_rejects_one_file_for_extract_and_restore() {
	let original = id_library(4, false);
	let file = write_temp(&original);
	let path = path_arg(file.path());
	let side = write_temp(&[0x11; 11 * 4]);
	let side_path = path_arg(side.path());

	let output = run_blendinfo(&["strip", &path, "--extract-to", &side_path, "--restore-from", &side_path]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("is used both as"));
	assert_eq!(std::fs::read(file.path()).expect("reads back"), original);
	assert_eq!(std::fs::read(side.path()).expect("reads side"), vec![0x11; 11 * 4]);
}

#[test]
fn json_flag_is_documented_for_every_command() {
	for command in ["info", "dna", "ids", "stats", "locate", "graph", "dump", "strip"] {
		let output = run_blendinfo(&[command, "--help"]);
		assert!(output.status.success(), "{command} --help failed");
		let help = String::from_utf8_lossy(&output.stdout);
		assert!(help.contains("--json") && help.contains("Emit JSON"), "{command} help lacks --json text: {help}");
	}
}

#[test]
fn bad_address_literal_is_reported() {
	let file = write_temp(&int_ptr_pair());
	let path = path_arg(file.path());
	let output = run_blendinfo(&["locate", &path, "0xnope"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("invalid address literal"));
}
