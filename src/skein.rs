//! Skein1024 hash function and the pseudo-random byte stream built on it.
//!
//! This is a from-scratch implementation of the Skein v1.3 reference
//! algorithm, specialized to the 1024-bit state size used throughout the
//! rest of this crate as KDF, MAC, and PRF.

const STATE_WORDS: usize = 16;
const BLOCK_BYTES: usize = STATE_WORDS * 8;

const KEY_SCHEDULE_PARITY: u64 = 0x1BD1_1BDA_A9FC_1A22;
// Low 32 bits are the "SHA3" schema identifier, high 32 bits the version.
const SCHEMA_VER: u64 = (1u64 << 32) | 0x3341_4853;

// Tweak word T[1] packs the block-type tag into bits 56..61 and the
// first/final flags into bits 62/63 (bit positions 120..125/126/127 of the
// combined 128-bit tweak, offset by 64 for the second word).
const BLOCK_TYPE_CFG: u64 = 4 << 56;
const BLOCK_TYPE_MSG: u64 = 48 << 56;
const BLOCK_TYPE_OUT: u64 = 63 << 56;

const FLAG_FIRST: u64 = 1 << 62;
const FLAG_FINAL: u64 = 1 << 63;

/// Rotation constants R(d, j) for Skein1024, Table 4 of skein1.3.pdf, one
/// row per round of an 8-round group (all 8 rows are used; the group
/// repeats 10 times for the full 80 rounds).
const ROTATION: [[u32; 8]; 8] = [
    [24, 13, 8, 47, 8, 17, 22, 37],
    [38, 19, 10, 55, 49, 18, 23, 52],
    [33, 4, 51, 13, 34, 41, 59, 17],
    [5, 20, 48, 41, 47, 28, 16, 25],
    [41, 9, 37, 31, 12, 47, 44, 30],
    [16, 34, 56, 51, 4, 53, 42, 41],
    [31, 44, 47, 46, 19, 42, 44, 25],
    [9, 48, 35, 52, 23, 31, 37, 20],
];

/// The four word-pairing patterns a round can use, each covering all 16
/// state words (8 pairs). Round `r`'s pattern is `PERMUTATION[r % 4]`; the
/// rotation row is `ROTATION[r % 8]`, so the full 8-round group exercises
/// each pattern twice, each time with a different rotation row.
const PERMUTATION: [[usize; 16]; 4] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [0, 9, 2, 13, 6, 11, 4, 15, 10, 7, 12, 3, 14, 5, 8, 1],
    [0, 7, 2, 5, 4, 3, 6, 1, 12, 15, 14, 13, 8, 11, 10, 9],
    [0, 15, 2, 11, 6, 13, 4, 9, 14, 1, 8, 5, 10, 3, 12, 7],
];

fn mix(x: &mut [u64; STATE_WORDS], round: usize) {
    let rot = ROTATION[round % 8];
    let perm = PERMUTATION[round % 4];
    for j in 0..8 {
        let a = perm[j * 2];
        let b = perm[j * 2 + 1];
        x[a] = x[a].wrapping_add(x[b]);
        x[b] = x[b].rotate_left(rot[j]);
        x[b] ^= x[a];
    }
}

/// Streaming Skein1024 hash context.
///
/// Use [`Skein1024::init`] to configure the output length, feed message
/// bytes with [`Skein1024::update`] (any number of times), then consume the
/// context with [`Skein1024::finish`] to get the digest.
pub struct Skein1024 {
    x: [u64; STATE_WORDS],
    t: [u64; 2],
    buf: [u8; BLOCK_BYTES],
    buf_len: usize,
    output_bits: u64,
}

impl Skein1024 {
    /// Configure a new context for a digest of `output_bits` bits.
    pub fn init(output_bits: u64) -> Skein1024 {
        let mut ctx = Skein1024 {
            x: [0u64; STATE_WORDS],
            t: [0, 0],
            buf: [0u8; BLOCK_BYTES],
            buf_len: 0,
            output_bits,
        };

        let mut cfg = [0u8; BLOCK_BYTES];
        cfg[0..8].copy_from_slice(&SCHEMA_VER.to_le_bytes());
        cfg[8..16].copy_from_slice(&output_bits.to_le_bytes());
        // Tree info = sequential (leaf/node/max-level all zero), already zeroed.

        ctx.start_new_type(BLOCK_TYPE_CFG | FLAG_FIRST | FLAG_FINAL);
        ctx.process_block(&cfg, BLOCK_BYTES);
        ctx.start_new_type(BLOCK_TYPE_MSG | FLAG_FIRST);
        ctx
    }

    fn start_new_type(&mut self, block_type: u64) {
        self.t[0] = 0;
        self.t[1] = block_type;
        self.buf_len = 0;
    }

    fn process_block(&mut self, block: &[u8], byte_count_add: usize) {
        self.t[0] = self.t[0].wrapping_add(byte_count_add as u64);

        let mut w = [0u64; STATE_WORDS];
        for i in 0..STATE_WORDS {
            w[i] = u64::from_le_bytes(block[i * 8..i * 8 + 8].try_into().unwrap());
        }

        let mut ks = [0u64; STATE_WORDS + 1];
        ks[STATE_WORDS] = KEY_SCHEDULE_PARITY;
        for i in 0..STATE_WORDS {
            ks[i] = self.x[i];
            ks[STATE_WORDS] ^= self.x[i];
        }

        let ts = [self.t[0], self.t[1], self.t[0] ^ self.t[1]];

        let mut x = [0u64; STATE_WORDS];
        for i in 0..STATE_WORDS {
            x[i] = w[i].wrapping_add(ks[i]);
        }
        x[STATE_WORDS - 3] = x[STATE_WORDS - 3].wrapping_add(ts[0]);
        x[STATE_WORDS - 2] = x[STATE_WORDS - 2].wrapping_add(ts[1]);

        for r in 1..=(80 / 8) {
            let base = (r - 1) * 8;

            for round in base..base + 4 {
                mix(&mut x, round);
            }
            inject_key(&mut x, &ks, &ts, 2 * r - 1);

            for round in base + 4..base + 8 {
                mix(&mut x, round);
            }
            inject_key(&mut x, &ks, &ts, 2 * r);
        }

        for i in 0..STATE_WORDS {
            self.x[i] = x[i] ^ w[i];
        }
        self.t[1] &= !FLAG_FIRST;
    }

    /// Absorb more message bytes. May be called any number of times.
    pub fn update(&mut self, mut msg: &[u8]) {
        if msg.is_empty() {
            return;
        }

        if self.buf_len + msg.len() > BLOCK_BYTES {
            if self.buf_len > 0 {
                let take = BLOCK_BYTES - self.buf_len;
                self.buf[self.buf_len..BLOCK_BYTES].copy_from_slice(&msg[..take]);
                msg = &msg[take..];
                let buf = self.buf;
                self.process_block(&buf, BLOCK_BYTES);
                self.buf_len = 0;
            }
            while msg.len() > BLOCK_BYTES {
                let (block, rest) = msg.split_at(BLOCK_BYTES);
                self.process_block(block, BLOCK_BYTES);
                msg = rest;
            }
        }

        self.buf[self.buf_len..self.buf_len + msg.len()].copy_from_slice(msg);
        self.buf_len += msg.len();
    }

    /// Finalize the hash and produce `ceil(output_bits / 8)` bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.t[1] |= FLAG_FINAL;
        let mut last = [0u8; BLOCK_BYTES];
        last[..self.buf_len].copy_from_slice(&self.buf[..self.buf_len]);
        self.process_block(&last, self.buf_len);

        let byte_count = ((self.output_bits + 7) / 8) as usize;
        let saved_x = self.x;
        let mut out = Vec::with_capacity(byte_count);

        let mut i = 0u64;
        while (i as usize) * BLOCK_BYTES < byte_count {
            let mut ctr_block = [0u8; BLOCK_BYTES];
            ctr_block[0..8].copy_from_slice(&i.to_le_bytes());

            self.start_new_type(BLOCK_TYPE_OUT | FLAG_FIRST | FLAG_FINAL);
            self.process_block(&ctr_block, 8);

            let remaining = byte_count - (i as usize) * BLOCK_BYTES;
            let n = remaining.min(BLOCK_BYTES);
            for word in 0..(n + 7) / 8 {
                let word_bytes = self.x[word].to_le_bytes();
                let start = word * 8;
                let copy_len = (n - start).min(8);
                out.extend_from_slice(&word_bytes[..copy_len]);
            }

            self.x = saved_x;
            i += 1;
        }

        out
    }

    /// One-shot convenience: hash `msg` to `output_bits` bits.
    pub fn digest(msg: &[u8], output_bits: u64) -> Vec<u8> {
        let mut ctx = Skein1024::init(output_bits);
        ctx.update(msg);
        ctx.finish()
    }
}

fn inject_key(x: &mut [u64; STATE_WORDS], ks: &[u64; STATE_WORDS + 1], ts: &[u64; 3], r: usize) {
    for (i, xi) in x.iter_mut().enumerate() {
        *xi = xi.wrapping_add(ks[(r + i) % (STATE_WORDS + 1)]);
    }
    x[STATE_WORDS - 3] = x[STATE_WORDS - 3].wrapping_add(ts[r % 3]);
    x[STATE_WORDS - 2] = x[STATE_WORDS - 2].wrapping_add(ts[(r + 1) % 3]);
    x[STATE_WORDS - 1] = x[STATE_WORDS - 1].wrapping_add(r as u64);
}

const PRF_BUFFER_BYTES: usize = 1024;

/// A pseudo-random byte stream seeded from arbitrary bytes via Skein1024.
///
/// Refills its internal buffer by re-finalizing the same hash state once
/// the current buffer is exhausted, mirroring the reference tool's
/// `PseudoRandomDataBuffer` behavior.
pub struct PseudoRandomStream {
    ctx: Skein1024,
    buffer: Vec<u8>,
    pos: usize,
}

impl PseudoRandomStream {
    /// Seed a new stream from `seed`.
    pub fn new(seed: &[u8]) -> PseudoRandomStream {
        let mut ctx = Skein1024::init((PRF_BUFFER_BYTES * 8) as u64);
        ctx.update(seed);
        PseudoRandomStream {
            ctx,
            buffer: Vec::new(),
            pos: 0,
        }
    }

    fn refill(&mut self) {
        // Re-finalize the same chaining state to draw the next 1024 bytes,
        // consuming a clone so the context can be finalized again later.
        let clone = self.ctx.clone_for_refill();
        self.buffer = clone.finish();
        self.pos = 0;
    }

    /// Draw the next pseudo-random byte.
    pub fn next_byte(&mut self) -> u8 {
        if self.pos >= self.buffer.len() {
            self.refill();
        }
        let b = self.buffer[self.pos];
        self.pos += 1;
        b
    }

    /// Draw `n` pseudo-random bytes.
    pub fn next_bytes(&mut self, n: usize) -> Vec<u8> {
        (0..n).map(|_| self.next_byte()).collect()
    }
}

impl Skein1024 {
    /// Clone the context's current absorption state so it can be finalized
    /// more than once, used by [`PseudoRandomStream`] to refill its buffer
    /// without disturbing the seed.
    fn clone_for_refill(&self) -> Skein1024 {
        Skein1024 {
            x: self.x,
            t: self.t,
            buf: self.buf,
            buf_len: self.buf_len,
            output_bits: self.output_bits,
        }
    }
}

/// Run the Skein1024 self-test.
///
/// No known-answer digest for this exact construction (1024-bit state,
/// this tweak/configuration layout) ships anywhere in the reference
/// material this crate was built from, and hand-writing one without
/// executing the hash would just be a guess that silently fails the test
/// the moment it's wrong — worse than not checking at all. So this
/// verifies what actually can be checked without running the algorithm
/// end to end: the two fixed constants Skein1024 is built on
/// (`KEY_SCHEDULE_PARITY`, the published key-schedule parity word, and the
/// low 32 bits of `SCHEMA_VER`, the "SHA3" schema identifier) match their
/// documented values, and the implementation is internally consistent —
/// streaming matches one-shot, requested output lengths come back exactly,
/// and distinct inputs don't collide on a short fixed message. A
/// regression in block processing, output expansion, or either constant
/// fails at least one of these.
pub fn self_test() -> Result<(), &'static str> {
    if KEY_SCHEDULE_PARITY != 0x1BD1_1BDA_A9FC_1A22 {
        return Err("key schedule parity constant does not match the published Skein value");
    }
    if SCHEMA_VER & 0xFFFF_FFFF != 0x3341_4853 {
        return Err("schema identifier does not match the published \"SHA3\" tag");
    }

    let one_shot = Skein1024::digest(b"ot7 skein1024 self-test", 1024);
    let mut streamed = Skein1024::init(1024);
    streamed.update(b"ot7 skein1024 ");
    streamed.update(b"self-test");
    if streamed.finish() != one_shot {
        return Err("streaming digest disagrees with one-shot digest");
    }

    if Skein1024::digest(&[], 1).len() != 1 {
        return Err("1-bit output length did not round up to 1 byte");
    }
    if Skein1024::digest(&[], 256).len() != 32 {
        return Err("256-bit digest had wrong byte length");
    }
    if Skein1024::digest(&[], 8192).len() != 1024 {
        return Err("8192-bit digest had wrong byte length");
    }

    if Skein1024::digest(&[], 256) == Skein1024::digest(&[0u8; 128], 256) {
        return Err("empty message collided with a zero-filled block");
    }

    Ok(())
}
