use std::{
    env,
    error::Error,
    ffi::OsString,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
};

use heatshrink_rs::*;

/// Bytes read from the input file at a time
const READ_CHUNK: usize = 4096;

/// The sink / poll / finish calls shared by both directions
#[cfg(feature = "std")]
trait Stream {
    fn sink(&mut self, inp: &[u8]) -> (SinkRes, usize);
    fn poll(&mut self, outp: &mut [u8]) -> (PollRes, usize);
    fn finish(&mut self) -> FinishRes;
}
#[cfg(feature = "std")]
impl Stream for Encoder {
    fn sink(&mut self, inp: &[u8]) -> (SinkRes, usize) {
        Encoder::sink(self, inp)
    }
    fn poll(&mut self, outp: &mut [u8]) -> (PollRes, usize) {
        Encoder::poll(self, outp)
    }
    fn finish(&mut self) -> FinishRes {
        Encoder::finish(self)
    }
}
#[cfg(feature = "std")]
impl Stream for Decoder {
    fn sink(&mut self, inp: &[u8]) -> (SinkRes, usize) {
        Decoder::sink(self, inp)
    }
    fn poll(&mut self, outp: &mut [u8]) -> (PollRes, usize) {
        Decoder::poll(self, outp)
    }
    fn finish(&mut self) -> FinishRes {
        Decoder::finish(self)
    }
}

#[cfg(feature = "std")]
fn drain(s: &mut impl Stream, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let (res, n) = s.poll(&mut buf);
        out.write_all(&buf[..n])?;
        if res == PollRes::Empty {
            return Ok(());
        }
    }
}

#[cfg(feature = "std")]
fn pump(
    s: &mut impl Stream,
    inp: &mut impl Read,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let len = inp.read(&mut buf)?;
        if len == 0 {
            break;
        }

        let mut sunk = 0;
        while sunk < len {
            let (_, n) = s.sink(&buf[sunk..len]);
            sunk += n;
            drain(s, out)?;
        }
    }

    while s.finish() == FinishRes::More {
        drain(s, out)?;
    }
    Ok(())
}

#[cfg(feature = "std")]
fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<OsString> = env::args_os().collect();

    if args.len() < 6 {
        println!(
            "Usage: {} e|d window_bits lookahead_bits input output",
            args[0].to_string_lossy()
        );
        return Ok(());
    }

    let mode = &args[1];
    let window_bits: u8 = args[2].to_string_lossy().parse()?;
    let lookahead_bits: u8 = args[3].to_string_lossy().parse()?;
    let inp_fn = &args[4];
    let outp_fn = &args[5];

    let cfg = Config::new(window_bits, lookahead_bits)?;
    let mut inp_f = BufReader::new(File::open(inp_fn)?);
    let mut outp_f = BufWriter::new(File::create(outp_fn)?);

    match mode.to_str() {
        Some("e") => {
            let mut enc = Encoder::with_config(cfg);
            pump(&mut enc, &mut inp_f, &mut outp_f)?;
        }
        Some("d") => {
            let mut dec = Decoder::with_config(READ_CHUNK, cfg)?;
            pump(&mut dec, &mut inp_f, &mut outp_f)?;
        }
        _ => {
            println!("Invalid mode {}", mode.to_string_lossy());
            return Ok(());
        }
    }

    outp_f.flush()?;
    Ok(())
}

#[cfg(not(feature = "std"))]
fn main() {
    println!("Demo requires std feature");
}
