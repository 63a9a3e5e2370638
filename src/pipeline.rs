//! Per-image orchestration: binarize, locate, evaluate candidates, aggregate.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::{Binarizer, DecodeOptions};
use crate::decoder::qr_decoder::{DecodedQr, QrDecoder};
use crate::decoder::version;
use crate::detector::{self, linear, sampler};
use crate::error::{DecodeError, StageError};
use crate::models::point::quad_contains;
use crate::models::{BitMatrix, CandidateKind, DecodeResult, FinderCandidate, LumaImage, Point, Symbology};
use crate::oned::{ScanLine, code128, ean};
use crate::utils::binarization::binarize;

/// Decode every symbol in `image`.
///
/// Per-candidate failures are logged and skipped; the call itself only
/// fails when decoding is disabled. Results come back in candidate rank
/// order, de-duplicated, and truncated to `max_symbols`.
#[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn decode(
    image: &LumaImage<'_>,
    options: &DecodeOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    if !options.enable_decoders {
        return Err(DecodeError::DecodersDisabled);
    }

    let mut results = Vec::new();
    for method in binarizer_attempts(options) {
        let mut matrix = match binarize(image, method) {
            Ok(matrix) => matrix,
            Err(err) => {
                debug!(%err, "nothing to decode");
                return Ok(Vec::new());
            }
        };

        results = decode_matrix(&matrix, image, options);
        if results.is_empty() && options.try_invert {
            matrix.invert();
            results = decode_matrix(&matrix, image, options);
            debug!(found = results.len(), "inverted image retried");
        }
        debug!(binarizer = %method, found = results.len(), "binarizer pass done");
        if !results.is_empty() {
            break;
        }
    }

    if options.max_symbols > 0 {
        results.truncate(options.max_symbols);
    }
    Ok(results)
}

/// Binarizers tried in order until one yields a result
fn binarizer_attempts(options: &DecodeOptions) -> Vec<Binarizer> {
    match options.binarizer {
        Binarizer::Auto => vec![Binarizer::Hybrid, Binarizer::GlobalHistogram],
        Binarizer::GlobalHistogram if options.try_harder => {
            vec![Binarizer::GlobalHistogram, Binarizer::Hybrid]
        }
        other if options.try_harder => vec![other, Binarizer::GlobalHistogram],
        other => vec![other],
    }
}

/// Locate and evaluate all candidates in one binary image
fn decode_matrix(
    matrix: &BitMatrix,
    luma: &LumaImage<'_>,
    options: &DecodeOptions,
) -> Vec<DecodeResult> {
    let candidates = detector::locate(matrix, Some(luma), options);
    if candidates.is_empty() {
        trace!(err = %StageError::NoPatternFound, "no candidates");
        return Vec::new();
    }

    let evaluated: Vec<Result<DecodeResult, StageError>> = if options.parallel {
        candidates
            .par_iter()
            .map(|c| evaluate(matrix, c, options))
            .collect()
    } else {
        candidates
            .iter()
            .map(|c| evaluate(matrix, c, options))
            .collect()
    };

    let mut results = Vec::new();
    for (candidate, outcome) in candidates.iter().zip(evaluated) {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => trace!(
                symbology = %candidate.symbology(),
                x = candidate.center.x,
                y = candidate.center.y,
                %err,
                "candidate rejected"
            ),
        }
    }
    debug!(
        candidates = candidates.len(),
        decoded = results.len(),
        "candidates evaluated"
    );
    dedupe(results)
}

/// Evaluate one candidate end to end
pub fn evaluate(
    matrix: &BitMatrix,
    candidate: &FinderCandidate,
    options: &DecodeOptions,
) -> Result<DecodeResult, StageError> {
    match &candidate.kind {
        CandidateKind::Qr {
            top_left,
            top_right,
            bottom_left,
        } => evaluate_qr(
            matrix,
            top_left,
            top_right,
            bottom_left,
            candidate.module_size,
        ),
        CandidateKind::Linear {
            symbology,
            line,
            vertical,
            start,
            reversed,
            ..
        } => evaluate_linear(matrix, *symbology, *line, *vertical, *start, *reversed, options),
    }
}

fn evaluate_qr(
    matrix: &BitMatrix,
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    module_size: f32,
) -> Result<DecodeResult, StageError> {
    let estimate = sampler::estimate_dimension(top_left, top_right, bottom_left, module_size)
        .ok_or(StageError::SamplingFailed("dimension estimate out of range"))?;

    // Small symbols carry no version blocks, so neighbouring sizes are tried
    let mut dimensions = vec![estimate];
    if estimate < 45 {
        dimensions.extend(
            [estimate.wrapping_sub(4), estimate + 4]
                .into_iter()
                .filter(|&d| (21..=45).contains(&d)),
        );
    }

    let mut last_err = StageError::NoPatternFound;
    for dimension in dimensions {
        match decode_qr_at(matrix, top_left, top_right, bottom_left, module_size, dimension) {
            Ok(result) => return Ok(result),
            Err(err) => {
                trace!(dimension, %err, "qr attempt failed");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

fn decode_qr_at(
    matrix: &BitMatrix,
    top_left: &Point,
    top_right: &Point,
    bottom_left: &Point,
    module_size: f32,
    dimension: usize,
) -> Result<DecodeResult, StageError> {
    let sample = |dimension| {
        sampler::sample_qr(matrix, top_left, top_right, bottom_left, module_size, dimension)
    };
    let sampled = sample(dimension)?;

    let (decoded, position) = match QrDecoder::decode(&sampled.grid) {
        Ok(decoded) => (decoded, sampled.position),
        Err(err) => {
            // The version blocks may name a different size than the estimate
            let declared = version::extract(&sampled.grid)
                .or_else(|_| version::extract(&sampled.grid.transposed()));
            match declared {
                Ok(v) if v.dimension() != dimension => {
                    debug!(
                        estimated = dimension,
                        declared = v.dimension(),
                        "resampling at declared version"
                    );
                    let resampled = sample(v.dimension())?;
                    (QrDecoder::decode(&resampled.grid)?, resampled.position)
                }
                _ => return Err(err),
            }
        }
    };

    Ok(qr_result(decoded, position))
}

fn qr_result(decoded: DecodedQr, mut position: [Point; 4]) -> DecodeResult {
    // A mirrored symbol was sampled transposed: its top-right is our bottom-left
    if decoded.metadata.mirrored {
        position.swap(1, 3);
    }
    DecodeResult {
        symbology: Symbology::Qr,
        text: decoded.payload.text,
        bytes: decoded.payload.bytes,
        error_count: decoded.error_count,
        position,
        qr: Some(decoded.metadata),
    }
}

fn evaluate_linear(
    matrix: &BitMatrix,
    symbology: Symbology,
    line: usize,
    vertical: bool,
    start: usize,
    reversed: bool,
    options: &DecodeOptions,
) -> Result<DecodeResult, StageError> {
    let scan = ScanLine::from_bits(&linear::line_bits(matrix, line, vertical, reversed));
    let index = scan.run_at(start).ok_or(StageError::NoPatternFound)?;

    let read = match symbology {
        Symbology::Code128 => code128::decode_runs(&scan, index)?,
        _ => ean::classify(ean::decode_runs(&scan, index)?, options)
            .ok_or(StageError::MalformedPayload("symbology not enabled"))?,
    };
    if !options.allows(read.symbology) {
        return Err(StageError::MalformedPayload("symbology not enabled"));
    }

    let from = linear::line_point(matrix, line, vertical, reversed, read.start as f32);
    let to = linear::line_point(matrix, line, vertical, reversed, read.end as f32);
    let across = if vertical {
        Point::new(1.0, 0.0)
    } else {
        Point::new(0.0, 1.0)
    };
    Ok(DecodeResult {
        symbology: read.symbology,
        text: read.text,
        bytes: read.bytes,
        error_count: 0,
        position: [
            from,
            to,
            Point::new(to.x + across.x, to.y + across.y),
            Point::new(from.x + across.x, from.y + across.y),
        ],
        qr: None,
    })
}

/// Same symbology and payload at overlapping positions
fn is_duplicate(a: &DecodeResult, b: &DecodeResult) -> bool {
    if a.symbology != b.symbology || a.bytes != b.bytes {
        return false;
    }
    let (ca, cb) = (a.center(), b.center());
    quad_contains(&a.position, &cb)
        || quad_contains(&b.position, &ca)
        || ca.distance(&cb) < a.extent().min(b.extent()) / 2.0
}

/// Keep the first (best ranked) of each group of duplicates
fn dedupe(results: Vec<DecodeResult>) -> Vec<DecodeResult> {
    let mut kept: Vec<DecodeResult> = Vec::with_capacity(results.len());
    for result in results {
        if !kept.iter().any(|k| is_duplicate(k, &result)) {
            kept.push(result);
        }
    }
    kept
}
