//! Run-length depackers used by the compressed save formats.
//!
//! Every paint program rolled its own escape scheme. They fall into three
//! shapes: forward escape runs (`escape, count, value`), forward trailing
//! runs recognised by lookahead (`value, count, escape`), and backward
//! streams that are unpacked from the last byte towards the first.
//!
//! Depackers never panic and never touch memory outside `input` and
//! `output`. Forward schemes clamp runs to the space left; backward schemes
//! stop on a run that does not fit and flag the overrun.

use serde::Serialize;

/// How a forward escape sequence encodes its repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountEncoding {
    /// The count byte is the run length; zero means 256.
    ZeroMeans256,
    /// The count byte is the run length; zero terminates the stream.
    ZeroStops,
    /// The run length is the count byte plus one.
    PlusOne,
}

impl CountEncoding {
    #[inline]
    fn run_length(self, count: u8) -> Option<usize> {
        match (self, count) {
            (CountEncoding::ZeroMeans256, 0) => Some(256),
            (CountEncoding::ZeroStops, 0) => None,
            (CountEncoding::PlusOne, n) => Some(n as usize + 1),
            (_, n) => Some(n as usize),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Depacker {
    /// Forward scan: `escape, count, value` expands to a run, anything else
    /// is a literal.
    Escape { escape: u8, count: CountEncoding },
    /// Forward scan: `value, count, escape` expands to a run when the escape
    /// appears two bytes ahead and is not followed by another escape.
    Trailing { escape: u8 },
    /// Backward scan: `value, count, escape` expands to a run, any other byte
    /// `n` copies the `n - 1` bytes that precede it. Input below `floor` is
    /// never scanned.
    BackwardEscape { escape: u8, floor: usize },
    /// Backward scan with eight marker bytes stored in the input at `table`
    /// (followed by one unused byte and three pair colours).
    BackwardMarkers { table: usize, floor: usize },
}

/// What a depack pass achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DepackOutcome {
    /// Bytes written into the output.
    pub written: usize,
    /// Bytes of input consumed.
    pub consumed: usize,
    /// The output was filled completely.
    pub complete: bool,
    /// A backward run would have written outside the output.
    pub overrun: bool,
}

impl Depacker {
    /// Generic escape RLE (`rle_ecb`): zero count is a full 256 byte run.
    pub const fn escape(escape: u8) -> Self {
        Depacker::Escape {
            escape,
            count: CountEncoding::ZeroMeans256,
        }
    }

    /// Funpaint 2.
    pub const fn funpaint(escape: u8) -> Self {
        Depacker::Escape {
            escape,
            count: CountEncoding::ZeroStops,
        }
    }

    /// Pixel Perfect.
    pub const fn pixel_perfect(escape: u8) -> Self {
        Depacker::Escape {
            escape,
            count: CountEncoding::PlusOne,
        }
    }

    /// UIFLI Editor.
    pub const fn uifli(escape: u8) -> Self {
        Depacker::Trailing { escape }
    }

    /// Hires Manager.
    pub const fn hires_manager() -> Self {
        Depacker::BackwardEscape {
            escape: 0x00,
            floor: 0x10,
        }
    }

    /// True Paint.
    pub const fn true_paint() -> Self {
        Depacker::BackwardMarkers {
            table: 0x7f,
            floor: 0x111,
        }
    }

    pub fn depack(&self, input: &[u8], output: &mut [u8]) -> DepackOutcome {
        match *self {
            Depacker::Escape { escape, count } => depack_escape(escape, count, input, output),
            Depacker::Trailing { escape } => depack_trailing(escape, input, output),
            Depacker::BackwardEscape { escape, floor } => {
                depack_backward_escape(escape, floor, input, output)
            }
            Depacker::BackwardMarkers { table, floor } => {
                depack_backward_markers(table, floor, input, output)
            }
        }
    }
}

fn fill_forward(output: &mut [u8], dst: &mut usize, value: u8, run: usize) {
    let n = run.min(output.len() - *dst);
    output[*dst..*dst + n].fill(value);
    *dst += n;
}

fn depack_escape(escape: u8, count: CountEncoding, input: &[u8], output: &mut [u8]) -> DepackOutcome {
    let mut src = 0usize;
    let mut dst = 0usize;

    while dst < output.len() && src < input.len() {
        let value = input[src];
        src += 1;

        if value != escape {
            output[dst] = value;
            dst += 1;
            continue;
        }

        let Some(&raw) = input.get(src) else { break };
        src += 1;
        let Some(run) = count.run_length(raw) else { break };
        let Some(&fill) = input.get(src) else { break };
        src += 1;
        fill_forward(output, &mut dst, fill, run);
    }

    DepackOutcome {
        written: dst,
        consumed: src,
        complete: dst == output.len(),
        overrun: false,
    }
}

fn depack_trailing(escape: u8, input: &[u8], output: &mut [u8]) -> DepackOutcome {
    let mut src = 0usize;
    let mut dst = 0usize;

    while dst < output.len() && src < input.len() {
        let is_run = input.get(src + 2) == Some(&escape)
            && input.get(src + 3) != Some(&escape)
            && input.get(src + 4) != Some(&escape);
        let value = input[src];
        src += 1;

        if is_run {
            let run = match input[src] {
                0 => 256,
                n => n as usize,
            };
            src += 2;
            fill_forward(output, &mut dst, value, run);
        } else {
            output[dst] = value;
            dst += 1;
        }
    }

    DepackOutcome {
        written: dst,
        consumed: src.min(input.len()),
        complete: dst == output.len(),
        overrun: false,
    }
}

/// Reads a byte stream from its end towards `floor`.
struct BackReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BackReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: data.len(),
        }
    }

    /// Next byte for an argument read; may dip below the scan floor.
    #[inline]
    fn take(&mut self) -> Option<u8> {
        if self.pos == 0 {
            return None;
        }
        self.pos -= 1;
        Some(self.data[self.pos])
    }

    #[inline]
    fn above(&self, floor: usize) -> bool {
        self.pos > floor
    }
}

/// Fills a buffer from its end towards the start.
struct BackWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> BackWriter<'a> {
    fn new(out: &'a mut [u8]) -> Self {
        let pos = out.len();
        Self { out, pos }
    }

    #[inline]
    fn has_room(&self) -> bool {
        self.pos > 0
    }

    #[inline]
    fn fits(&self, n: usize) -> bool {
        n <= self.pos
    }

    #[inline]
    fn put(&mut self, value: u8) {
        self.pos -= 1;
        self.out[self.pos] = value;
    }

    fn run(&mut self, value: u8, n: usize) {
        self.out[self.pos - n..self.pos].fill(value);
        self.pos -= n;
    }

    fn outcome(&self, consumed: usize, overrun: bool) -> DepackOutcome {
        DepackOutcome {
            written: self.out.len() - self.pos,
            consumed,
            complete: self.pos == 0,
            overrun,
        }
    }
}

fn depack_backward_escape(escape: u8, floor: usize, input: &[u8], output: &mut [u8]) -> DepackOutcome {
    let mut reader = BackReader::new(input);
    let mut writer = BackWriter::new(output);
    let mut overrun = false;

    while reader.above(floor) && writer.has_room() {
        let Some(value) = reader.take() else { break };

        if value == escape {
            let (Some(count), Some(fill)) = (reader.take(), reader.take()) else {
                break;
            };
            let n = count as usize;
            if !writer.fits(n) {
                overrun = true;
                break;
            }
            writer.run(fill, n);
        } else {
            let n = (value as usize).saturating_sub(1);
            if !writer.fits(n) || reader.pos < floor + n {
                overrun = true;
                break;
            }
            for _ in 0..n {
                let Some(literal) = reader.take() else { break };
                writer.put(literal);
            }
        }
    }

    writer.outcome(input.len() - reader.pos, overrun)
}

fn depack_backward_markers(table: usize, floor: usize, input: &[u8], output: &mut [u8]) -> DepackOutcome {
    let (Some(markers), Some(pairs)) = (input.get(table..table + 8), input.get(table + 9..table + 12)) else {
        return DepackOutcome::default();
    };

    let mut reader = BackReader::new(input);
    let mut writer = BackWriter::new(output);
    let mut overrun = false;

    while reader.above(floor) && writer.has_room() {
        let Some(value) = reader.take() else { break };
        let marker = markers.iter().position(|&m| m == value);

        let (fill, n) = match marker {
            // escaped literal
            Some(0) => match reader.take() {
                Some(literal) => (literal, 1),
                None => break,
            },
            Some(1) => match reader.take() {
                Some(fill) => (fill, 3),
                None => break,
            },
            Some(2) => match reader.take() {
                Some(count) => (0, count as usize + 2),
                None => break,
            },
            Some(3) => (0, 3),
            Some(4) => match (reader.take(), reader.take()) {
                (Some(count), Some(fill)) => (fill, count as usize + 2),
                _ => break,
            },
            Some(pair) if pair >= 5 => (pairs[pair - 5], 2),
            _ => (value, 1),
        };

        if !writer.fits(n) {
            overrun = true;
            break;
        }
        writer.run(fill, n);
    }

    writer.outcome(input.len() - reader.pos, overrun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_runs_and_literals() {
        let input = [0x01, 0xfe, 0x04, 0xaa, 0x02, 0xfe, 0x02, 0x00];
        let mut out = [0u8; 8];
        let outcome = Depacker::escape(0xfe).depack(&input, &mut out);
        assert_eq!(out, [0x01, 0xaa, 0xaa, 0xaa, 0xaa, 0x02, 0x00, 0x00]);
        assert_eq!(outcome.written, 8);
        assert_eq!(outcome.consumed, 8);
        assert!(outcome.complete);
    }

    #[test]
    fn escape_zero_count_is_a_full_256_byte_run() {
        let input = [0xfe, 0x00, 0x07, 0x09];
        let mut out = vec![0u8; 257];
        let outcome = Depacker::escape(0xfe).depack(&input, &mut out);
        assert!(out[..256].iter().all(|&b| b == 0x07));
        assert_eq!(out[256], 0x09);
        assert!(outcome.complete);
    }

    #[test]
    fn escape_runs_are_clamped_to_the_output() {
        let input = [0xfe, 0x10, 0x33, 0x01];
        let mut out = [0u8; 4];
        let outcome = Depacker::escape(0xfe).depack(&input, &mut out);
        assert_eq!(out, [0x33; 4]);
        assert_eq!(outcome.consumed, 3);
        assert!(outcome.complete);
    }

    #[test]
    fn escape_stops_on_exhausted_input() {
        let input = [0x05, 0xfe, 0x03];
        let mut out = [0u8; 6];
        let outcome = Depacker::escape(0xfe).depack(&input, &mut out);
        assert_eq!(outcome.written, 1);
        assert!(!outcome.complete);
    }

    #[test]
    fn funpaint_zero_count_terminates() {
        let input = [0x01, 0xfe, 0x02, 0x08, 0xfe, 0x00, 0x04, 0x05];
        let mut out = [0u8; 6];
        let outcome = Depacker::funpaint(0xfe).depack(&input, &mut out);
        assert_eq!(out, [0x01, 0x08, 0x08, 0x00, 0x00, 0x00]);
        assert_eq!(outcome.written, 3);
        assert_eq!(outcome.consumed, 6);
        assert!(!outcome.complete);
    }

    #[test]
    fn pixel_perfect_counts_are_biased_by_one() {
        let input = [0x9b, 0x00, 0x11, 0x9b, 0x02, 0x22];
        let mut out = [0u8; 4];
        Depacker::pixel_perfect(0x9b).depack(&input, &mut out);
        assert_eq!(out, [0x11, 0x22, 0x22, 0x22]);
    }

    #[test]
    fn trailing_escape_detected_by_lookahead() {
        // 0x44 x3, literal 0x01, 0x55 x256 (count 0)
        let input = [0x44, 0x03, 0xee, 0x01, 0x55, 0x00, 0xee];
        let mut out = vec![0u8; 260];
        let outcome = Depacker::uifli(0xee).depack(&input, &mut out);
        assert_eq!(&out[..4], &[0x44, 0x44, 0x44, 0x01]);
        assert!(out[4..260].iter().all(|&b| b == 0x55));
        assert_eq!(outcome.consumed, 7);
        assert!(outcome.complete);
    }

    #[test]
    fn escape_three_ahead_cancels_the_run() {
        let input = [0x44, 0x03, 0xee, 0x12, 0xee];
        let mut out = [0u8; 2];
        Depacker::uifli(0xee).depack(&input, &mut out);
        assert_eq!(out, [0x44, 0x03]);
    }

    #[test]
    fn backward_escape_unpacks_from_the_end() {
        // 16 bytes of header that are never scanned, then the stream.
        let mut input = vec![0xffu8; 0x10];
        // literal block "1 2" (marker 3 = copy two bytes), then run of 4 x 0x09
        input.extend_from_slice(&[0x09, 0x04, 0x00, 0x01, 0x02, 0x03]);
        let mut out = [0u8; 6];
        let outcome = Depacker::hires_manager().depack(&input, &mut out);
        assert_eq!(out, [0x09, 0x09, 0x09, 0x09, 0x01, 0x02]);
        assert_eq!(outcome.written, 6);
        assert_eq!(outcome.consumed, 6);
        assert!(outcome.complete);
        assert!(!outcome.overrun);
    }

    #[test]
    fn backward_escape_reports_overrun() {
        let mut input = vec![0u8; 0x10];
        input.extend_from_slice(&[0x09, 0x08, 0x00]);
        let mut out = [0u8; 4];
        let outcome = Depacker::hires_manager().depack(&input, &mut out);
        assert!(outcome.overrun);
        assert_eq!(outcome.written, 0);
        assert_eq!(out, [0u8; 4]);
    }

    fn true_paint_input(stream: &[u8]) -> Vec<u8> {
        let mut input = vec![0u8; 0x111];
        input[0x7f..0x87].copy_from_slice(&[0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7]);
        input[0x88..0x8b].copy_from_slice(&[0x0a, 0x0b, 0x0c]);
        input.extend_from_slice(stream);
        input
    }

    #[test]
    fn backward_markers_cover_every_code() {
        // Codes are read from the end, so arguments sit before their code.
        let stream = [
            0xf6, // pair 3
            0x07, 0xf0, // escaped literal
            0x01, // plain literal
            0xf3, // three zeros
            0x00, 0xf2, // count + 2 zeros
            0x05, 0x01, 0xf4, // count + 2 copies of 0x05
            0x06, 0xf1, // three copies of 0x06
            0xf5, // pair 2
        ];
        let input = true_paint_input(&stream);
        let mut out = [0u8; 17];
        let outcome = Depacker::true_paint().depack(&input, &mut out);
        assert_eq!(
            out,
            [
                0x0c, 0x0c, 0x07, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x05, 0x05, 0x06,
                0x06, 0x06, 0x0b, 0x0b
            ]
        );
        assert_eq!(outcome.consumed, stream.len());
        assert!(outcome.complete);
        assert!(!outcome.overrun);
    }

    #[test]
    fn backward_markers_stop_at_the_table() {
        let input = true_paint_input(&[0x01, 0x02]);
        let mut out = [0u8; 4];
        let outcome = Depacker::true_paint().depack(&input, &mut out);
        assert_eq!(out, [0x00, 0x00, 0x01, 0x02]);
        assert_eq!(outcome.written, 2);
        assert!(!outcome.complete);
    }

    #[test]
    fn backward_markers_without_table_do_nothing() {
        let mut out = [0u8; 4];
        let outcome = Depacker::true_paint().depack(&[0u8; 16], &mut out);
        assert_eq!(outcome, DepackOutcome::default());
    }

    /// Runs, zero runs and literal noise, salted with `specials`.
    fn sample(len: usize, specials: &[u8]) -> Vec<u8> {
        let mut state = 0x1234_5678u32;
        let mut next = move || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        };

        let mut data = Vec::with_capacity(len + 600);
        while data.len() < len {
            match next() % 4 {
                0 => {
                    let value = next();
                    data.extend(std::iter::repeat_n(value, 1 + next() as usize * 2));
                }
                1 => data.extend(std::iter::repeat_n(0, 2 + next() as usize)),
                2 => {
                    let special = specials[next() as usize % specials.len()];
                    data.extend(std::iter::repeat_n(special, 1 + next() as usize % 3));
                }
                _ => {
                    for _ in 0..1 + next() % 16 {
                        data.push(next());
                    }
                }
            }
        }
        data.truncate(len);
        data
    }

    fn pack_escape(data: &[u8], escape: u8, max_run: usize, count: fn(usize) -> u8) -> Vec<u8> {
        let mut packed = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let value = data[i];
            let run = data[i..].iter().take(max_run).take_while(|&&b| b == value).count();
            if run >= 4 || value == escape {
                packed.extend_from_slice(&[escape, count(run), value]);
            } else {
                packed.extend(std::iter::repeat_n(value, run));
            }
            i += run;
        }
        packed
    }

    fn assert_round_trip(depacker: Depacker, packed: &[u8], header: usize, data: &[u8]) {
        let mut out = vec![0u8; data.len()];
        let outcome = depacker.depack(packed, &mut out);
        assert!(outcome.complete, "{depacker:?}: {outcome:?}");
        assert!(!outcome.overrun);
        assert_eq!(outcome.consumed, packed.len() - header);
        assert!(out == data, "{depacker:?} output differs");
    }

    #[test]
    fn escape_round_trip() {
        let data = sample(4096, &[0xfe]);
        let packed = pack_escape(&data, 0xfe, 256, |run| run as u8);
        assert!(packed.len() < data.len());
        assert_round_trip(Depacker::escape(0xfe), &packed, 0, &data);
    }

    #[test]
    fn funpaint_round_trip() {
        let data = sample(4096, &[0xfe]);
        let packed = pack_escape(&data, 0xfe, 255, |run| run as u8);
        assert_round_trip(Depacker::funpaint(0xfe), &packed, 0, &data);
    }

    #[test]
    fn pixel_perfect_round_trip() {
        let data = sample(4096, &[0x9b]);
        let packed = pack_escape(&data, 0x9b, 256, |run| (run - 1) as u8);
        assert_round_trip(Depacker::pixel_perfect(0x9b), &packed, 0, &data);
    }

    /// Segments go out in forward order; each one is decodable from its
    /// last byte: `value, count, 0x00` for runs, literals then `len + 1`.
    fn pack_hires_manager(data: &[u8]) -> Vec<u8> {
        fn flush(packed: &mut Vec<u8>, literals: &mut Vec<u8>) {
            if !literals.is_empty() {
                packed.extend_from_slice(literals);
                packed.push(literals.len() as u8 + 1);
                literals.clear();
            }
        }

        let mut packed = vec![0xffu8; 0x10];
        let mut literals = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let value = data[i];
            let run = data[i..].iter().take(255).take_while(|&&b| b == value).count();
            if run >= 4 {
                flush(&mut packed, &mut literals);
                packed.extend_from_slice(&[value, run as u8, 0x00]);
                i += run;
            } else {
                literals.push(value);
                if literals.len() == 254 {
                    flush(&mut packed, &mut literals);
                }
                i += 1;
            }
        }
        flush(&mut packed, &mut literals);
        packed
    }

    #[test]
    fn hires_manager_round_trip_fills_the_window() {
        let data = sample(0x3ff2, &[0x00, 0x01, 0xff]);
        let packed = pack_hires_manager(&data);
        assert!(packed.len() < data.len());
        assert_round_trip(Depacker::hires_manager(), &packed, 0x10, &data);
    }

    const MARKERS: [u8; 8] = [0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7];
    const PAIRS: [u8; 3] = [0x0a, 0x0b, 0x0c];

    fn pack_true_paint(data: &[u8]) -> Vec<u8> {
        let mut packed = vec![0u8; 0x111];
        packed[0x7f..0x87].copy_from_slice(&MARKERS);
        packed[0x88..0x8b].copy_from_slice(&PAIRS);

        let mut i = 0;
        while i < data.len() {
            let value = data[i];
            let run = data[i..].iter().take(257).take_while(|&&b| b == value).count();
            let pair = PAIRS.iter().position(|&p| p == value);

            i += if value == 0 && run == 3 {
                packed.push(MARKERS[3]);
                3
            } else if value == 0 && run >= 2 {
                packed.extend_from_slice(&[(run - 2) as u8, MARKERS[2]]);
                run
            } else if let (2, Some(pair)) = (run, pair) {
                packed.push(MARKERS[5 + pair]);
                2
            } else if run == 3 {
                packed.extend_from_slice(&[value, MARKERS[1]]);
                3
            } else if run >= 4 {
                packed.extend_from_slice(&[value, (run - 2) as u8, MARKERS[4]]);
                run
            } else {
                packed.push(value);
                if MARKERS.contains(&value) {
                    packed.push(MARKERS[0]);
                }
                1
            };
        }
        packed
    }

    #[test]
    fn true_paint_round_trip() {
        let mut specials = MARKERS.to_vec();
        specials.extend_from_slice(&PAIRS);
        let data = sample(4096, &specials);
        let packed = pack_true_paint(&data);
        assert!(packed.len() - 0x111 < data.len());
        assert_round_trip(Depacker::true_paint(), &packed, 0x111, &data);
    }
}
