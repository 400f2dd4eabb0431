//! # Metadata Embedding
//!
//! Carries an [`ExportDocument`] inside the PNG it describes, as a `zTXt`
//! chunk placed immediately before `IEND`:
//!
//! ```text
//! "vision-canvas" 0x00 0x00 <zlib(JSON)>
//!  keyword        |    |
//!                 |    compression method 0 (zlib deflate)
//!                 keyword terminator
//! ```
//!
//! Standard decoders skip the chunk; [`extract`] recovers the exact JSON.

use super::{find_iend, make_chunk, ChunkReader, ZTXT};
use crate::error::{CanvasError, Result};
use crate::model::ExportDocument;
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;

/// Keyword identifying our `zTXt` chunk.
pub const KEYWORD: &[u8] = b"vision-canvas";
/// miniz_oxide's highest effort level.
pub const COMPRESSION_LEVEL: u8 = 10;
const COMPRESSION_METHOD_DEFLATE: u8 = 0;

/// Build the complete `zTXt` chunk for `document`.
pub fn metadata_chunk(document: &ExportDocument) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(document)?;
    let compressed = compress_to_vec_zlib(&json, COMPRESSION_LEVEL);

    let mut payload = Vec::with_capacity(KEYWORD.len() + 2 + compressed.len());
    payload.extend_from_slice(KEYWORD);
    payload.push(0);
    payload.push(COMPRESSION_METHOD_DEFLATE);
    payload.extend_from_slice(&compressed);

    tracing::debug!(
        "metadata chunk: {} bytes JSON, {} bytes compressed",
        json.len(),
        compressed.len()
    );
    Ok(make_chunk(ZTXT, &payload))
}

/// Splice `document` into `png` just before the `IEND` chunk.
///
/// Every byte before the splice point is preserved. A metadata chunk from
/// an earlier export is dropped rather than duplicated. Fails with
/// [`CanvasError::MalformedContainer`] when `png` is not a complete PNG.
pub fn embed(png: &[u8], document: &ExportDocument) -> Result<Vec<u8>> {
    let iend = find_iend(png)?;
    let chunk = metadata_chunk(document)?;
    let existing = find_metadata_span(png)?;

    let mut out = Vec::with_capacity(png.len() + chunk.len());
    match existing {
        Some((start, end)) => {
            out.extend_from_slice(&png[..start]);
            out.extend_from_slice(&png[end..iend]);
        }
        None => out.extend_from_slice(&png[..iend]),
    }
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&png[iend..]);
    Ok(out)
}

/// Recover the embedded document, or `None` if the PNG carries none.
pub fn extract(png: &[u8]) -> Result<Option<ExportDocument>> {
    let Some(json) = extract_json(png)? else {
        return Ok(None);
    };
    let document = serde_json::from_slice(&json)?;
    Ok(Some(document))
}

/// The raw inflated JSON bytes of the embedded document.
pub fn extract_json(png: &[u8]) -> Result<Option<Vec<u8>>> {
    for chunk in ChunkReader::new(png)? {
        let chunk = chunk?;
        if chunk.tag != ZTXT {
            continue;
        }
        let Some(compressed) = metadata_payload(chunk.data)? else {
            continue;
        };
        let json = decompress_to_vec_zlib(compressed).map_err(|e| {
            CanvasError::MalformedContainer(format!("metadata payload failed to inflate: {:?}", e))
        })?;
        return Ok(Some(json));
    }
    Ok(None)
}

/// Split a `zTXt` data field; `None` if it belongs to another keyword.
fn metadata_payload(data: &[u8]) -> Result<Option<&[u8]>> {
    let Some(nul) = data.iter().position(|&b| b == 0) else {
        return Err(CanvasError::MalformedContainer(
            "zTXt chunk without keyword terminator".to_string(),
        ));
    };
    if &data[..nul] != KEYWORD {
        return Ok(None);
    }
    match data.get(nul + 1) {
        Some(&COMPRESSION_METHOD_DEFLATE) => Ok(Some(&data[nul + 2..])),
        Some(method) => Err(CanvasError::MalformedContainer(format!(
            "unsupported zTXt compression method {}",
            method
        ))),
        None => Err(CanvasError::MalformedContainer(
            "zTXt chunk missing compression method".to_string(),
        )),
    }
}

fn find_metadata_span(png: &[u8]) -> Result<Option<(usize, usize)>> {
    for chunk in ChunkReader::new(png)? {
        let chunk = chunk?;
        if chunk.tag == ZTXT && chunk.data.starts_with(KEYWORD) && chunk.data.get(KEYWORD.len()) == Some(&0) {
            return Ok(Some((chunk.offset, chunk.end())));
        }
    }
    Ok(None)
}
