use std::io::{self, Write};

use blendinfo::blend::{BlendError, BlockWarning, Result};

/// Serialize `value` as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(value: &T) -> Result<()> {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::from)?;
	writeln!(out)?;
	Ok(())
}

/// Parse decimal or `0x`-prefixed hex address literal.
pub(crate) fn parse_address(value: &str) -> Result<u64> {
	let parsed = if let Some(stripped) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		u64::from_str_radix(stripped, 16)
	} else {
		value.parse::<u64>()
	};

	parsed.map_err(|_| BlendError::InvalidAddressLiteral { value: value.to_owned() })
}

/// Render an address as fixed-width hex.
pub(crate) fn ptr_hex(value: u64) -> String {
	format!("0x{value:016x}")
}

/// Render block code bytes as printable label.
pub(crate) fn render_code(code: [u8; 4]) -> String {
	blendinfo::blend::BlockCode(code).to_string()
}

/// Escape text for a double-quoted Graphviz string.
pub(crate) fn dot_escape(input: &str) -> String {
	input.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Print recorded warnings in text mode.
pub(crate) fn print_warnings(warnings: &[BlockWarning]) {
	if warnings.is_empty() {
		return;
	}
	println!("warnings: {}", warnings.len());
	for warning in warnings {
		println!("  {warning}");
	}
}

/// Render recorded warnings for JSON output.
pub(crate) fn warning_strings(warnings: &[BlockWarning]) -> Vec<String> {
	warnings.iter().map(ToString::to_string).collect()
}
