//! Block (de)interleaving and per-block error correction.

use tracing::debug;

use super::reed_solomon::{self, ReedSolomonDecoder};
use super::tables::BlockLayout;
use crate::error::StageError;

/// One Reed-Solomon block: data codewords followed by EC codewords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodewordBlock {
    /// Leading data codewords in `codewords`
    pub data_len: usize,
    /// Data then EC codewords
    pub codewords: Vec<u8>,
}

/// Split the raw codeword sequence into blocks.
///
/// Data codewords are interleaved column by column across all blocks
/// (short blocks have no entry in the last column), then EC codewords.
pub fn deinterleave(raw: &[u8], layout: &BlockLayout) -> Result<Vec<CodewordBlock>, StageError> {
    if raw.len() < layout.total_codewords {
        return Err(StageError::SamplingFailed("too few codewords"));
    }

    let mut blocks: Vec<CodewordBlock> = (0..layout.num_blocks)
        .map(|b| CodewordBlock {
            data_len: layout.data_len(b),
            codewords: Vec::with_capacity(layout.data_len(b) + layout.ecc_per_block),
        })
        .collect();

    let mut source = raw.iter().copied();
    for i in 0..=layout.short_data {
        for block in blocks.iter_mut() {
            if i < block.data_len {
                block.codewords.extend(source.next());
            }
        }
    }
    for _ in 0..layout.ecc_per_block {
        for block in blocks.iter_mut() {
            block.codewords.extend(source.next());
        }
    }

    Ok(blocks)
}

/// Correct every block and concatenate the data codewords.
///
/// Returns the data and the total number of corrected codewords.
pub fn correct_blocks(
    blocks: Vec<CodewordBlock>,
    ecc_per_block: usize,
) -> Result<(Vec<u8>, usize), StageError> {
    let decoder = ReedSolomonDecoder::new(ecc_per_block);
    let mut data = Vec::with_capacity(blocks.iter().map(|b| b.data_len).sum());
    let mut corrected = 0;

    for (index, mut block) in blocks.into_iter().enumerate() {
        match decoder.decode(&mut block.codewords) {
            Ok(count) => corrected += count,
            Err(err) => {
                debug!(block = index, %err, "block uncorrectable");
                return Err(StageError::ErrorCorrectionFailed { block: index });
            }
        }
        data.extend_from_slice(&block.codewords[..block.data_len]);
    }

    Ok((data, corrected))
}

/// Split data into blocks, append EC codewords and interleave
pub fn interleave(data: &[u8], layout: &BlockLayout) -> Vec<u8> {
    let mut blocks = Vec::with_capacity(layout.num_blocks);
    let mut offset = 0;
    for b in 0..layout.num_blocks {
        let len = layout.data_len(b);
        let chunk = &data[offset..offset + len];
        offset += len;
        blocks.push((chunk, reed_solomon::encode(chunk, layout.ecc_per_block)));
    }

    let mut out = Vec::with_capacity(layout.total_codewords);
    for i in 0..=layout.short_data {
        for (chunk, _) in &blocks {
            if let Some(&byte) = chunk.get(i) {
                out.push(byte);
            }
        }
    }
    for i in 0..layout.ecc_per_block {
        for (_, ecc) in &blocks {
            out.push(ecc[i]);
        }
    }
    out
}
