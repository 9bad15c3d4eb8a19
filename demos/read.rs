use std::env;
use std::io::{self, Read};
use std::time::Duration;

use han_deframer::reader::{AidonAssembler, Error};
use han_deframer::telegram::Telegram;

const PORT_NAME: &'static str = "/dev/ttyUSB0";
const BAUD_RATE: u32 = 2_400;

fn main() {
    let mut args = env::args().skip(1);
    let port_name = args.next().unwrap_or_else(|| PORT_NAME.to_string());
    let baud_rate = args
        .next()
        .map(|b| b.parse().expect("baud rate has to be a number"))
        .unwrap_or(BAUD_RATE);

    let port = serialport::new(port_name.as_str(), baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::Even)
        .stop_bits(serialport::StopBits::One)
        .timeout(Duration::from_millis(10))
        .open();

    let mut assembler = AidonAssembler::new();

    match port {
        Ok(mut port) => {
            let mut serial_buf: Vec<u8> = vec![0; 1000];
            loop {
                match port.read(serial_buf.as_mut_slice()) {
                    Ok(t) => {
                        for byte in &serial_buf[..t] {
                            match assembler.feed(*byte) {
                                Ok(true) => {
                                    match Telegram::parse(&assembler) {
                                        Ok(Some(telegram)) => {
                                            println!("received telegram = {:?}", telegram)
                                        }
                                        Ok(None) => (),
                                        Err(e) => eprintln!("Error while parsing telegram = {:?}", e),
                                    }
                                    assembler.acknowledge();
                                }
                                Ok(false) => (),
                                Err(Error::FrameTooLarge) => eprintln!(
                                    "Telegram too large, {} dropped so far",
                                    assembler.overflow_count()
                                ),
                                Err(e) => eprintln!("Error while reading telegram = {:?}", e),
                            }
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::TimedOut => (),
                    Err(e) => eprintln!("{:?}", e),
                }
            }
        }
        Err(e) => {
            eprintln!("Failed to open \"{}\". Error: {}", port_name, e);
            ::std::process::exit(1);
        }
    }
}
