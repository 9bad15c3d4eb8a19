use std::env;

use han_deframer::reader::AidonAssembler;
use han_deframer::telegram::Telegram;

/// Decodes hex dumps of a serial capture and prints the telegrams found in them.
///
/// All arguments are concatenated into a single byte stream, so a telegram may span several
/// arguments.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        return Err("Provide at least 1 hex encoded argument".into());
    }

    let mut assembler = AidonAssembler::new();
    let mut telegram_count = 0;
    for arg in &args {
        let hex: String = arg.chars().filter(|c| !c.is_whitespace()).collect();
        let clean_hex = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(&hex);

        let mut bytes = vec![0; clean_hex.len() / 2];
        let decoded_len = base16::decode_slice(clean_hex, &mut bytes[..])
            .map_err(|e| format!("could not decode {}: {:?}", arg, e))?;

        for byte in &bytes[..decoded_len] {
            match assembler.feed(*byte) {
                Ok(true) => {
                    telegram_count += 1;
                    match Telegram::parse(&assembler) {
                        Ok(Some(telegram)) => println!(
                            "telegram {}: {:?}, valid frame format: {}",
                            telegram_count,
                            telegram,
                            telegram.has_valid_frame_format()
                        ),
                        Ok(None) => (),
                        Err(e) => eprintln!(
                            "telegram {}: {} (raw: {:02x?})",
                            telegram_count,
                            e,
                            assembler.telegram().unwrap_or_default()
                        ),
                    }
                    assembler.acknowledge();
                }
                Ok(false) => (),
                Err(e) => eprintln!("{}", e),
            }
        }
    }

    println!(
        "{} telegrams, {} dropped as too large, {} bytes left in the buffer",
        telegram_count,
        assembler.overflow_count(),
        assembler.len()
    );
    Ok(())
}
