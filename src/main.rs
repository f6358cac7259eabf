use rand::RngCore;
use sds_fstream::{FileStream, OpenMode, SeekOrigin, INVALID_SIZE};
use std::io::{self, Write};

fn main() {
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("fail to init tracing subscriber: {}", err);
    }

    println!("SDS file stream shell v0.1.0");
    println!("Type 'EXIT' to quit, 'HELP' for help\n");

    let mut stream = FileStream::new();
    let stdin = io::stdin();
    let mut line_buffer = String::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        line_buffer.clear();
        match stdin.read_line(&mut line_buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let input = line_buffer.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        match run_command(&mut stream, input) {
            Ok(()) => {}
            Err(e) => println!("Error: {}", e),
        }
    }
}

fn run_command(stream: &mut FileStream, input: &str) -> Result<(), String> {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match command.to_ascii_uppercase().as_str() {
        "HELP" => print_help(),
        "OPEN" => {
            let [path, mode] = args[..] else {
                return Err("usage: OPEN <path> <mode>".to_string());
            };
            let mode = mode.parse::<OpenMode>().map_err(|e| format!("{}", e))?;
            stream.open(path, mode);
            if !stream.is_open() {
                let reason = stream
                    .last_open_error()
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(format!("cannot open {}: {}", path, reason));
            }
            println!("Opened {} ({:?})", path, mode);
        }
        "CLOSE" => {
            stream.close();
            println!("Closed");
        }
        "READ" => {
            let count = parse_number(args.first(), "READ <n>")?;
            let mut buf = vec![0u8; count];
            let read = stream.read(&mut buf);
            report_size("read", read)?;
            buf.truncate(read);
            println!("{} bytes: {}", read, String::from_utf8_lossy(&buf));
            print_hex(&buf);
        }
        "WRITE" => {
            let written = stream.write(rest.as_bytes());
            report_size("write", written)?;
            println!("Wrote {} bytes", written);
        }
        "RANDOM" => {
            let count = parse_number(args.first(), "RANDOM <n>")?;
            let mut buf = vec![0u8; count];
            rand::thread_rng().fill_bytes(&mut buf);
            let written = stream.write(&buf);
            report_size("write", written)?;
            println!("Wrote {} random bytes", written);
        }
        "SEEK" => {
            let (offset, origin) = match args[..] {
                [offset] => (offset, SeekOrigin::Begin),
                [offset, origin] => (
                    offset,
                    origin.parse::<SeekOrigin>().map_err(|e| format!("{}", e))?,
                ),
                _ => return Err("usage: SEEK <offset> [BEGIN|CURRENT|END]".to_string()),
            };
            let offset: i64 = offset
                .parse()
                .map_err(|_| format!("bad offset: {}", offset))?;
            stream.seek(offset, origin);
        }
        "TELL" => {
            let position = stream.tell();
            report_size("tell", position)?;
            println!("{}", position);
        }
        "SIZE" => {
            let size = stream.file_size(true);
            report_size("size", size)?;
            println!("{} bytes", size);
        }
        "FLUSH" => {
            if stream.flush() != 0 {
                return Err("flush failed".to_string());
            }
        }
        "SYNC" => {
            let prefer_data = args.first().is_some_and(|arg| arg.eq_ignore_ascii_case("data"));
            stream.durable_sync(prefer_data);
        }
        "STATUS" => {}
        other => return Err(format!("unknown command: {}", other)),
    }

    print_status(stream);
    Ok(())
}

fn parse_number(arg: Option<&&str>, usage: &str) -> Result<usize, String> {
    arg.and_then(|value| value.parse().ok())
        .ok_or_else(|| format!("usage: {}", usage))
}

fn report_size(op: &str, size: usize) -> Result<(), String> {
    if size == INVALID_SIZE {
        Err(format!("{} refused", op))
    } else {
        Ok(())
    }
}

fn print_status(stream: &mut FileStream) {
    let good = stream.good();
    println!(
        "[open={} good={} eof={} status={:?}]",
        stream.is_open(),
        good,
        stream.is_eof(),
        stream.status()
    );
}

fn print_hex(bytes: &[u8]) {
    for chunk in bytes.chunks(16) {
        let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("  {}", line.join(" "));
    }
}

fn print_help() {
    println!("SDS file stream shell - Available Commands:");
    println!();
    println!("  OPEN <path> <mode>       - Open a file (closes the current one)");
    println!("  CLOSE                    - Close the file");
    println!("  READ <n>                 - Read up to n bytes");
    println!("  WRITE <text>             - Write text");
    println!("  RANDOM <n>               - Write n random bytes");
    println!("  SEEK <offset> [origin]   - Seek (origin BEGIN, CURRENT or END)");
    println!("  TELL                     - Show the current offset");
    println!("  SIZE                     - Show the file size");
    println!("  FLUSH                    - Flush OS buffers");
    println!("  SYNC [DATA]              - Durable sync (DATA prefers data-only sync)");
    println!("  STATUS                   - Show the status register");
    println!("  EXIT                     - Quit");
    println!();
    println!("Modes:");
    println!("  r       - ReadOnly");
    println!("  r-end   - ReadOnlyFromEnd");
    println!("  w       - WriteKeepExisting");
    println!("  w-end   - WriteKeepExistingFromEnd");
    println!("  w-trunc - WriteDiscardExisting (creates the file)");
    println!("  rw      - ReadWriteKeepExisting");
    println!("  rw-end  - ReadWriteKeepExistingFromEnd");
    println!();
}
