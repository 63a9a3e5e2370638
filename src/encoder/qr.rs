//! QR symbol synthesis: segment encoding, EC codewords, placement and masking.

use tracing::debug;

use crate::decoder::bitstream::place_codewords;
use crate::decoder::codewords::interleave;
use crate::decoder::format::{self, FormatInfo};
use crate::decoder::function_mask::FunctionMask;
use crate::decoder::modes::Mode;
use crate::decoder::modes::alphanumeric::alphanumeric_index;
use crate::decoder::tables::{alignment_centers, block_layout, data_capacity_bits};
use crate::decoder::unmask::apply_mask;
use crate::decoder::version;
use crate::error::EncodeError;
use crate::models::{ECLevel, MaskPattern, SymbolGrid, Version};

/// Encoder knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QrEncodeOptions {
    /// Smallest version to use
    pub min_version: Option<Version>,
    /// Force a mask instead of choosing by penalty score
    pub mask: Option<MaskPattern>,
}

/// MSB-first bit accumulator
#[derive(Debug, Default)]
struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    fn push(&mut self, value: u32, width: usize) {
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << (7 - i)))
            })
            .collect()
    }
}

/// Cheapest single mode able to carry the whole text
fn select_mode(text: &str) -> Mode {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        Mode::Numeric
    } else if text.chars().all(|c| alphanumeric_index(c).is_some()) {
        Mode::Alphanumeric
    } else {
        Mode::Byte
    }
}

fn data_bits(mode: Mode, text: &str) -> usize {
    let n = text.len();
    match mode {
        Mode::Numeric => 10 * (n / 3) + [0, 4, 7][n % 3],
        Mode::Alphanumeric => 11 * (n / 2) + 6 * (n % 2),
        _ => 8 * n,
    }
}

fn char_count(mode: Mode, text: &str) -> usize {
    match mode {
        Mode::Byte => text.len(),
        _ => text.chars().count(),
    }
}

fn push_segment(buffer: &mut BitBuffer, mode: Mode, text: &str, version: Version) {
    buffer.push(mode.bits(), 4);
    buffer.push(char_count(mode, text) as u32, mode.char_count_bits(version));
    match mode {
        Mode::Numeric => {
            for group in text.as_bytes().chunks(3) {
                let value = group
                    .iter()
                    .fold(0u32, |acc, &d| acc * 10 + (d - b'0') as u32);
                buffer.push(value, [0, 4, 7, 10][group.len()]);
            }
        }
        Mode::Alphanumeric => {
            let values: Vec<u32> = text.chars().filter_map(alphanumeric_index).collect();
            for pair in values.chunks(2) {
                match pair {
                    [a, b] => buffer.push(a * 45 + b, 11),
                    [a] => buffer.push(*a, 6),
                    _ => {}
                }
            }
        }
        _ => {
            for byte in text.bytes() {
                buffer.push(byte as u32, 8);
            }
        }
    }
}

/// Encode `text` as a QR symbol
pub fn encode(
    text: &str,
    ec_level: ECLevel,
    options: &QrEncodeOptions,
) -> Result<SymbolGrid, EncodeError> {
    let mode = select_mode(text);
    let count = char_count(mode, text);
    let start = options.min_version.unwrap_or(Version::MIN);

    let version = Version::all()
        .filter(|v| v.number() >= start.number())
        .find(|&v| {
            let needed = 4 + mode.char_count_bits(v) + data_bits(mode, text);
            count < (1 << mode.char_count_bits(v)) && needed <= data_capacity_bits(v, ec_level)
        })
        .ok_or(EncodeError::DataTooLong {
            len: text.len(),
            capacity: data_capacity_bits(Version::MAX, ec_level) / 8,
        })?;

    let capacity = data_capacity_bits(version, ec_level);
    let mut buffer = BitBuffer::default();
    push_segment(&mut buffer, mode, text, version);
    let terminator = (capacity - buffer.len()).min(4);
    buffer.push(0, terminator);
    let pad_to_byte = (8 - buffer.len() % 8) % 8;
    buffer.push(0, pad_to_byte);

    let mut data = buffer.to_bytes();
    for pad in [0xEC, 0x11].into_iter().cycle() {
        if data.len() * 8 >= capacity {
            break;
        }
        data.push(pad);
    }

    let layout = block_layout(version, ec_level);
    let codewords = interleave(&data, &layout);

    let func = FunctionMask::new(version);
    let mut base = SymbolGrid::new(version.dimension());
    draw_function_patterns(&mut base, version);
    place_codewords(&mut base, &func, &codewords);

    let candidates: Vec<MaskPattern> = match options.mask {
        Some(mask) => vec![mask],
        None => MaskPattern::ALL.to_vec(),
    };
    let mut best: Option<(u32, SymbolGrid)> = None;
    for mask in candidates {
        let mut grid = base.clone();
        apply_mask(&mut grid, mask, &func);
        write_format(&mut grid, ec_level, mask);
        let score = penalty(&grid);
        if best.as_ref().is_none_or(|(s, _)| score < *s) {
            best = Some((score, grid));
        }
    }

    debug!(
        version = version.number(),
        %ec_level,
        ?mode,
        codewords = codewords.len(),
        "qr encoded"
    );
    best.map(|(_, grid)| grid).ok_or(EncodeError::DataTooLong {
        len: text.len(),
        capacity: capacity / 8,
    })
}

/// Finders, timing, alignment patterns, dark module and version blocks
fn draw_function_patterns(grid: &mut SymbolGrid, version: Version) {
    let dim = grid.dimension();

    for i in 8..dim - 8 {
        grid.set(i, 6, i % 2 == 0);
        grid.set(6, i, i % 2 == 0);
    }

    for (ox, oy) in [(0, 0), (dim - 7, 0), (0, dim - 7)] {
        for dy in 0..7 {
            for dx in 0..7 {
                let ring = dx == 0 || dx == 6 || dy == 0 || dy == 6;
                let core = (2..=4).contains(&dx) && (2..=4).contains(&dy);
                grid.set(ox + dx, oy + dy, ring || core);
            }
        }
    }

    let centers = alignment_centers(version);
    let last = centers.len().saturating_sub(1);
    for (i, &cy) in centers.iter().enumerate() {
        for (j, &cx) in centers.iter().enumerate() {
            if (i == 0 && j == 0) || (i == 0 && j == last) || (i == last && j == 0) {
                continue;
            }
            for dy in -2i32..=2 {
                for dx in -2i32..=2 {
                    let dark = dx.abs().max(dy.abs()) != 1;
                    grid.set(
                        (cx as i32 + dx) as usize,
                        (cy as i32 + dy) as usize,
                        dark,
                    );
                }
            }
        }
    }

    grid.set(8, dim - 8, true);
    version::write(grid, version);
}

fn write_format(grid: &mut SymbolGrid, ec_level: ECLevel, mask: MaskPattern) {
    let code = FormatInfo {
        ec_level,
        mask_pattern: mask,
        bit_errors: 0,
    }
    .code_word();
    let (first, second) = format::positions(grid.dimension());
    for (i, (&a, &b)) in first.iter().zip(second.iter()).enumerate() {
        let bit = (code >> (14 - i)) & 1 == 1;
        grid.set(a.0, a.1, bit);
        grid.set(b.0, b.1, bit);
    }
}

/// Mask penalty score (ISO/IEC 18004 7.8.3)
fn penalty(grid: &SymbolGrid) -> u32 {
    const FINDER_LIKE: [bool; 11] = [
        true, false, true, true, true, false, true, false, false, false, false,
    ];
    let dim = grid.dimension();
    let mut score = 0u32;

    let mut line = Vec::with_capacity(dim);
    for pass in 0..2 {
        for i in 0..dim {
            line.clear();
            line.extend((0..dim).map(|j| if pass == 0 { grid.get(j, i) } else { grid.get(i, j) }));

            // Runs of five or more
            let mut run = 1;
            for j in 1..=dim {
                if j < dim && line[j] == line[j - 1] {
                    run += 1;
                } else {
                    if run >= 5 {
                        score += 3 + (run - 5);
                    }
                    run = 1;
                }
            }

            // Finder-like sequences with four light modules on one side
            for window in line.windows(11) {
                if window == FINDER_LIKE || window.iter().rev().eq(FINDER_LIKE.iter()) {
                    score += 40;
                }
            }
        }
    }

    // 2x2 blocks of one colour
    for y in 0..dim - 1 {
        for x in 0..dim - 1 {
            let c = grid.get(x, y);
            if c == grid.get(x + 1, y) && c == grid.get(x, y + 1) && c == grid.get(x + 1, y + 1) {
                score += 3;
            }
        }
    }

    // Dark module balance in 5% steps
    let total = (dim * dim) as u32;
    let dark = grid.modules().count_dark() as u32;
    let deviation = (dark * 2).abs_diff(total) * 10 / total;
    score + deviation * 10
}
