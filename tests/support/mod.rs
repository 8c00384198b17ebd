//! Shared helpers for the streaming round-trip tests.
//!
//! Inputs are generated deterministically so any failure can be
//! reproduced from its size and seed.

#![allow(dead_code)]

use heatshrink_rs::{Decoder, Encoder, FinishRes, PollRes, SinkRes};

/// Encoder/decoder parameters for one round trip
#[derive(Debug, Clone, Copy)]
pub struct ConfigInfo {
    /// 0 is silent, 1 prints sizes, 2 also dumps every buffer
    pub log_level: u8,
    pub window_bits: u8,
    pub lookahead_bits: u8,
    pub decoder_input_buffer_size: usize,
}

impl ConfigInfo {
    pub fn new(window_bits: u8, lookahead_bits: u8, decoder_input_buffer_size: usize) -> Self {
        Self {
            log_level: 0,
            window_bits,
            lookahead_bits,
            decoder_input_buffer_size,
        }
    }
}

pub fn dump_buf(name: &str, buf: &[u8]) {
    for (i, &b) in buf.iter().enumerate() {
        let c = if b.is_ascii_graphic() { b as char } else { '.' };
        println!("{} {}: 0x{:02x} ('{}')", name, i, b, c);
    }
}

/// Lowercase letters from a fixed LCG, the same sequence for the same seed
pub fn fill_with_pseudo_random_letters(buf: &mut [u8], seed: u64) {
    let mut rn: u64 = 9223372036854775783; // prime under 2^64
    for b in buf.iter_mut() {
        rn = rn.wrapping_mul(seed).wrapping_add(seed);
        *b = (rn % 26) as u8 + b'a';
    }
}

/// Stream `input` through an encoder and then a decoder, checking the
/// sink / poll / finish protocol at every step and the output at the end
pub fn compress_and_expand_and_check(input: &[u8], cfg: ConfigInfo) {
    let mut enc = Encoder::new(cfg.window_bits, cfg.lookahead_bits).unwrap();
    let mut dec = Decoder::new(
        cfg.decoder_input_buffer_size,
        cfg.window_bits,
        cfg.lookahead_bits,
    )
    .unwrap();

    let input_size = input.len();
    let comp_sz = input_size + input_size / 2 + 4;
    let decomp_sz = input_size + input_size / 2 + 4;
    let mut comp = vec![0u8; comp_sz];
    let mut decomp = vec![0u8; decomp_sz];

    if cfg.log_level > 1 {
        println!("\n^^ COMPRESSING\n");
        dump_buf("input", input);
    }

    let mut sunk = 0;
    let mut polled = 0;
    while sunk < input_size {
        let (res, count) = enc.sink(&input[sunk..]);
        assert_eq!(res, SinkRes::Ok);
        sunk += count;
        if cfg.log_level > 1 {
            println!("^^ sunk {}", count);
        }
        if sunk == input_size {
            assert_eq!(enc.finish(), FinishRes::More);
        }

        loop {
            let (res, count) = enc.poll(&mut comp[polled..]);
            polled += count;
            if cfg.log_level > 1 {
                println!("^^ polled {}", count);
            }
            if res == PollRes::Empty {
                break;
            }
        }

        assert!(
            polled < comp_sz,
            "compression should never expand that much"
        );
        if sunk == input_size {
            assert_eq!(enc.finish(), FinishRes::Done);
        }
    }

    if cfg.log_level > 0 {
        print!("in: {}, compressed: {} ", input_size, polled);
    }
    let compressed_size = polled;
    sunk = 0;
    polled = 0;

    if cfg.log_level > 1 {
        println!("\n^^ DECOMPRESSING\n");
        dump_buf("comp", &comp[..compressed_size]);
    }

    while sunk < compressed_size {
        let (res, count) = dec.sink(&comp[sunk..compressed_size]);
        assert_eq!(res, SinkRes::Ok);
        sunk += count;
        if cfg.log_level > 1 {
            println!("^^ sunk {}", count);
        }
        if sunk == compressed_size {
            assert_eq!(dec.finish(), FinishRes::More);
        }

        loop {
            let (res, count) = dec.poll(&mut decomp[polled..]);
            polled += count;
            if cfg.log_level > 1 {
                println!("^^ polled {}", count);
            }
            if res == PollRes::Empty {
                break;
            }
        }

        if sunk == compressed_size {
            assert_eq!(dec.finish(), FinishRes::Done);
        }
        assert!(
            polled <= input_size,
            "decompressed data is larger than original input: expected {}, got {}",
            input_size,
            polled
        );
    }

    if cfg.log_level > 0 {
        println!("decompressed: {}", polled);
    }
    assert_eq!(
        polled, input_size,
        "decompressed length does not match original input length"
    );

    if cfg.log_level > 1 {
        dump_buf("decomp", &decomp[..polled]);
    }
    for i in 0..input_size {
        assert_eq!(input[i], decomp[i], "mismatch at {}", i);
    }
}

pub fn pseudo_random_data_should_match(size: usize, seed: u64, cfg: ConfigInfo) {
    let mut input = vec![0u8; size];
    if cfg.log_level > 0 {
        println!(
            "\n-- size {}, seed {}, input buf {}\n",
            size, seed, cfg.decoder_input_buffer_size
        );
    }

    fill_with_pseudo_random_letters(&mut input, seed);
    compress_and_expand_and_check(&input, cfg);
}
