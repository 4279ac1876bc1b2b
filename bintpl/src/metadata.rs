//! The Metadata Engine: `<watch=…,update=…>` and `<packer=…,packtype=…>`
//! annotations attached to a declaration. See SPEC_FULL.md §4.G.

use crate::error::{Coord, InterpError};

/// Parsed form of a single `<key=value,...>` metadata annotation attached to
/// a `Decl` node. Exactly one of `watch` / `pack` is populated for a given
/// field — a declaration can't carry both kinds at once.
#[derive(Debug, Clone)]
pub enum FieldMetadata {
	Watch(WatchUpdate),
	Pack(PackUnpack),
}

#[derive(Debug, Clone)]
pub struct WatchUpdate {
	/// Names of the fields this one depends on.
	pub watched: Vec<String>,
	/// Name of the (native or user) function invoked with `watched`'s current
	/// values whenever one of them changes; its result is written into the
	/// annotated field.
	pub update_fn: String,
}

#[derive(Debug, Clone)]
pub struct PackUnpack {
	pub pack_fn: Option<String>,
	pub unpack_fn: String,
	pub packtype: Vec<String>,
}

/// Metadata key/value pairs as produced by the AST collaborator for a
/// `<...>` annotation, e.g. `[("watch", "a,b,c"), ("update", "Fn")]`.
pub fn parse_metadata(pairs: &[(String, String)], coord: Coord) -> Result<FieldMetadata, InterpError> {
	let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

	if let Some(update_fn) = get("update") {
		let watched = get("watch").ok_or_else(|| {
			InterpError::MetadataError("`update` requires a `watch` key".into(), coord)
		})?;
		let watched = watched.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
		return Ok(FieldMetadata::Watch(WatchUpdate { watched, update_fn: update_fn.to_string() }));
	}

	if let Some(unpack_fn) = get("unpack").or_else(|| get("packer")) {
		let packtype = get("packtype").ok_or_else(|| {
			InterpError::MetadataError("`unpack`/`packer` requires a `packtype` key".into(), coord)
		})?;
		let packtype = packtype.split_whitespace().map(|s| s.to_string()).collect();
		let pack_fn = get("pack").map(|s| s.to_string());
		return Ok(FieldMetadata::Pack(PackUnpack { pack_fn, unpack_fn: unpack_fn.to_string(), packtype }));
	}

	Err(InterpError::MetadataError("unrecognized metadata annotation".into(), coord))
}
