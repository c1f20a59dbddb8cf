/// Parsed SDNA field declarator details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldDecl<'a> {
	/// Identifier portion of the declarator.
	pub ident: &'a str,
	/// Pointer nesting depth (`*`, `**`, ...).
	pub ptr_depth: u8,
	/// Inline array dimensions in declaration order.
	pub dims: Vec<usize>,
	/// Whether declarator looks like a function pointer.
	pub is_func_ptr: bool,
}

impl FieldDecl<'_> {
	/// Whether the field stores pointer-width values.
	pub fn is_ptr(&self) -> bool {
		self.ptr_depth > 0 || self.is_func_ptr
	}

	/// Product of all dimensions (1 when there are none).
	pub fn element_count(&self) -> Option<usize> {
		self.dims.iter().try_fold(1_usize, |acc, dim| acc.checked_mul(*dim))
	}
}

/// Parse SDNA declarator text into pointer/array metadata.
///
/// Returns `None` when an array dimension is not a decimal number.
pub(crate) fn parse_field_decl(raw: &str) -> Option<FieldDecl<'_>> {
	let trimmed = raw.trim();
	let mut decl = FieldDecl {
		ident: trimmed,
		ptr_depth: 0,
		dims: Vec::new(),
		is_func_ptr: trimmed.contains(")("),
	};

	if let Some(start) = trimmed.find("(*") {
		let after = &trimmed[start + 2..];
		if let Some(close_idx) = after.find(')') {
			let inside = &after[..close_idx];
			let stars = inside.chars().take_while(|c| *c == '*').count();
			decl.ptr_depth = (stars as u8).saturating_add(1);
			let ident = inside.trim_start_matches('*').trim();
			if !ident.is_empty() {
				decl.ident = ident;
			}
			return Some(decl);
		}
	}

	let stars = trimmed.chars().take_while(|c| *c == '*').count();
	decl.ptr_depth = stars as u8;
	let mut tail = &trimmed[stars..];

	let ident_end = tail.find('[').unwrap_or(tail.len());
	let ident = tail[..ident_end].trim();
	if !ident.is_empty() {
		decl.ident = ident;
	}

	tail = &tail[ident_end..];
	while let Some(start) = tail.find('[') {
		let end = start + 1 + tail[start + 1..].find(']')?;
		let dim = tail[start + 1..end].trim().parse::<usize>().ok()?;
		decl.dims.push(dim);
		tail = &tail[end + 1..];
	}

	Some(decl)
}
