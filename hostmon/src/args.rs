//! Hand-rolled command line parsing.

use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub interval_ms: Option<u64>,
    pub count: Option<u64>,
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Why parsing stopped. `Help` is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsExit {
    Help(String),
    Invalid(String),
}

pub fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--interval MS|-i MS] [--count N|-n N] [--json] [--config PATH|-c PATH] [--help|-h]")
}

fn number(flag: &str, value: Option<String>, prog: &str) -> Result<u64, ArgsExit> {
    let v = value.ok_or_else(|| ArgsExit::Invalid(format!("{flag} needs a value\n{}", usage(prog))))?;
    v.parse::<u64>()
        .map_err(|_| ArgsExit::Invalid(format!("invalid value for {flag}: {v}\n{}", usage(prog))))
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, ArgsExit> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "hostmon".into());
    let mut parsed = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgsExit::Help(usage(&prog))),
            "--interval" | "-i" => {
                parsed.interval_ms = Some(number("--interval", it.next(), &prog)?);
            }
            "--count" | "-n" => {
                parsed.count = Some(number("--count", it.next(), &prog)?);
            }
            "--json" => parsed.json = true,
            "--config" | "-c" => {
                let path = it
                    .next()
                    .ok_or_else(|| ArgsExit::Invalid(format!("--config needs a value\n{}", usage(&prog))))?;
                parsed.config = Some(PathBuf::from(path));
            }
            _ if arg.starts_with("--interval=") => {
                let v = arg.split_once('=').map(|(_, v)| v.to_string());
                parsed.interval_ms = Some(number("--interval", v, &prog)?);
            }
            _ if arg.starts_with("--count=") => {
                let v = arg.split_once('=').map(|(_, v)| v.to_string());
                parsed.count = Some(number("--count", v, &prog)?);
            }
            _ if arg.starts_with("--config=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.config = Some(PathBuf::from(v));
                    }
                }
            }
            _ => {
                return Err(ArgsExit::Invalid(format!(
                    "Unexpected argument '{arg}'. {}",
                    usage(&prog)
                )));
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ParsedArgs, ArgsExit> {
        parse_args(std::iter::once("hostmon").chain(args.iter().copied()).map(String::from))
    }

    #[test]
    fn long_and_short_forms() {
        let a = parse(&["-i", "250", "--count", "3", "--json", "-c", "/tmp/h.json"]).unwrap();
        assert_eq!(a.interval_ms, Some(250));
        assert_eq!(a.count, Some(3));
        assert!(a.json);
        assert_eq!(a.config, Some(PathBuf::from("/tmp/h.json")));

        let b = parse(&["--interval=500", "--count=1", "--config=x.json"]).unwrap();
        assert_eq!(b.interval_ms, Some(500));
        assert_eq!(b.count, Some(1));
        assert_eq!(b.config, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn help_wins_over_other_flags() {
        match parse(&["-n", "2", "--help"]) {
            Err(ArgsExit::Help(text)) => assert!(text.starts_with("Usage: hostmon")),
            other => panic!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_numbers_and_strays() {
        assert!(matches!(parse(&["-i", "fast"]), Err(ArgsExit::Invalid(_))));
        assert!(matches!(parse(&["--count"]), Err(ArgsExit::Invalid(_))));
        assert!(matches!(parse(&["ws://host/ws"]), Err(ArgsExit::Invalid(_))));
    }
}
