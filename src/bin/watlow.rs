use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::mpsc;
use std::time::Duration;

use serialport::SerialPort;
use watlow_tpms::master::io::Master;
use watlow_tpms::{ParsedResponse, Value, ValueType, BAUD_RATE, DEFAULT_TIMEOUT, SET_POINT};

/// Read and write parameters of Watlow temperature controllers.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Read timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    timeout: f64,

    /// Convert temperatures between Celsius and the controller's Fahrenheit
    #[arg(long, short, global = true)]
    celsius: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a parameter, e.g. 4001 for the process value or 7001 for the set point
    Read {
        port: String,
        address: u8,
        parameter: u32,
        /// The parameter holds an integer rather than a float
        #[arg(long)]
        int: bool,
    },
    /// Write a parameter, the set point (7001) unless --param is given
    Write {
        port: String,
        address: u8,
        #[arg(allow_negative_numbers = true)]
        value: f64,
        #[arg(long, default_value_t = *SET_POINT)]
        param: u32,
        /// The parameter holds an integer rather than a float
        #[arg(long)]
        int: bool,
    },
    /// Read a parameter repeatedly until enter is pressed
    Poll {
        port: String,
        address: u8,
        parameter: u32,
        /// Seconds between reads
        interval: f32,
        #[arg(long)]
        int: bool,
    },
}

fn value_type(int: bool) -> ValueType {
    if int {
        ValueType::Integer
    } else {
        ValueType::Float32
    }
}

/// Seconds from the command line, rejecting negative and non-finite values.
fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("{} isn't a valid number of seconds", secs))
}

fn open(port: &str, address: u8, timeout: f64) -> Result<Master<Box<dyn SerialPort>>> {
    let serial = serialport::new(port, BAUD_RATE)
        .timeout(seconds(timeout)?)
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;
    Ok(Master::new(serial, address)?)
}

fn print_response(response: &ParsedResponse, celsius: bool) {
    let response = if celsius {
        response.map_float(watlow_tpms::fahrenheit_to_celsius)
    } else {
        *response
    };
    match (response.parameter(), response.result()) {
        (Some(param), Ok(value)) => println!("{}[{}]: {}", response.address(), param, value),
        (_, Ok(value)) => println!("{}: {}", response.address(), value),
        (_, Err(err)) => println!("{}: {}", response.address(), err),
    }
}

fn cmd_read(master: &mut Master<Box<dyn SerialPort>>, parameter: u32, int: bool) -> Result<ParsedResponse> {
    Ok(master.read_parameter(parameter, value_type(int))?)
}

fn write_value(value: f64, int: bool, celsius: bool) -> Result<Value> {
    if int {
        if value.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&value) {
            bail!("{} isn't a 16-bit unsigned integer", value);
        }
        Ok(Value::Integer(value as u16))
    } else if celsius {
        Ok(Value::float(watlow_tpms::celsius_to_fahrenheit(value))?)
    } else {
        Ok(Value::float(value)?)
    }
}

fn cmd_poll(
    master: &mut Master<Box<dyn SerialPort>>,
    parameter: u32,
    interval: f32,
    int: bool,
    celsius: bool,
) -> Result<()> {
    let delay = seconds(f64::from(interval))?;
    println!("Press enter to stop polling.");
    // check that the first read is ok before starting the poll stop thread
    print_response(&cmd_read(master, parameter, int)?, celsius);
    let (io_tx, io_rx) = mpsc::channel::<()>();
    std::thread::spawn(move || {
        let _ch = io_tx;
        let mut buf = String::new();
        let _ = std::io::stdin().read_line(&mut buf);
    });
    loop {
        if io_rx.recv_timeout(delay) == Err(mpsc::RecvTimeoutError::Disconnected) {
            break;
        }
        print_response(&cmd_read(master, parameter, int)?, celsius);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Read {
            port,
            address,
            parameter,
            int,
        } => {
            let mut master = open(&port, address, cli.timeout)?;
            print_response(&cmd_read(&mut master, parameter, int)?, cli.celsius);
        }
        Command::Write {
            port,
            address,
            value,
            param,
            int,
        } => {
            let value = write_value(value, int, cli.celsius)?;
            let mut master = open(&port, address, cli.timeout)?;
            print_response(&master.write_parameter(param, value)?, cli.celsius);
        }
        Command::Poll {
            port,
            address,
            parameter,
            interval,
            int,
        } => {
            let mut master = open(&port, address, cli.timeout)?;
            cmd_poll(&mut master, parameter, interval, int, cli.celsius)?;
        }
    }
    Ok(())
}
