use std::fmt::Debug;
use std::io::{self, Read};

use anyhow::{bail, ensure, Context};
use clap::{Parser, Subcommand, ValueEnum};
use structser::{decode, encode, Reader};
use structser_mutator::{Mutatable, RandomSource, StructuredMutator};
use tracing_subscriber::EnvFilter;

mod demo;

use demo::{Envelope, Message, Transaction};

#[derive(Parser)]
#[command(
    version = "1.0",
    about = "structser command line tool",
    long_about = "A command line tool for decoding and mutating structured fuzz inputs of the bundled schemas."
)]
struct Cmd {
    /// Schema the input is interpreted as
    #[arg(long, value_enum, default_value_t = Schema::Envelope, global = true)]
    schema: Schema,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Schema {
    /// A network message with its magic prefix
    Envelope,
    /// A bare network message
    Message,
    /// A single transaction
    Transaction,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex-encoded input from stdin and print the value
    Decode,
    /// Mutate a hex-encoded input from stdin
    Mutate {
        #[arg(long, help = "Seed for the mutation. A random seed is chosen and logged otherwise.")]
        seed: Option<u64>,

        #[arg(long, default_value_t = 4096, help = "Maximum length of the output in bytes.")]
        max_len: usize,

        #[arg(long, default_value_t = 1, help = "Number of chained mutations to print.")]
        rounds: usize,
    },
    /// Cross over the two hex-encoded inputs on the first two lines of stdin
    CrossOver {
        #[arg(long, help = "Seed for the crossover. A random seed is chosen and logged otherwise.")]
        seed: Option<u64>,

        #[arg(long, default_value_t = 4096, help = "Maximum length of the output in bytes.")]
        max_len: usize,
    },
    /// Run chained mutations from the default value and verify every output
    Check {
        #[arg(long, help = "Seed for the run. A random seed is chosen and logged otherwise.")]
        seed: Option<u64>,

        #[arg(long, default_value_t = 4096, help = "Maximum length of each output in bytes.")]
        max_len: usize,

        #[arg(long, default_value_t = 10_000, help = "Number of mutations to run.")]
        iterations: usize,
    },
}

fn random_source(seed: Option<u64>) -> RandomSource {
    seed.map_or_else(RandomSource::from_entropy, RandomSource::new)
}

fn read_hex_inputs() -> anyhow::Result<Vec<Vec<u8>>> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read from stdin")?;

    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| hex::decode(line).with_context(|| format!("line {} is not valid hex", i + 1)))
        .collect()
}

fn read_single_input() -> anyhow::Result<Vec<u8>> {
    // An empty stdin is a valid (empty) input
    Ok(read_hex_inputs()?.into_iter().next().unwrap_or_default())
}

fn decode_command<T: Mutatable + Debug>() -> anyhow::Result<()> {
    let bytes = read_single_input()?;
    let mut reader = Reader::new(&bytes);
    let value = T::decode(&mut reader);

    if reader.is_short() {
        tracing::warn!(len = bytes.len(), "input ended early, missing bytes were read as zeros");
    } else if !reader.is_exhausted() {
        tracing::warn!(
            trailing = reader.remaining(),
            "ignoring trailing bytes after the value"
        );
    }

    println!("{:#?}", value);
    println!("canonical: {}", hex::encode(encode(&value)));
    Ok(())
}

fn mutate_command<T: Mutatable>(seed: Option<u64>, max_len: usize, rounds: usize) -> anyhow::Result<()> {
    let mut bytes = read_single_input()?;
    let mutator = StructuredMutator::<T>::from_global();
    let mut rand = random_source(seed);

    for _ in 0..rounds {
        bytes = mutator.mutate(&bytes, max_len, rand.next_u64());
        println!("{}", hex::encode(&bytes));
    }
    Ok(())
}

fn cross_over_command<T: Mutatable>(seed: Option<u64>, max_len: usize) -> anyhow::Result<()> {
    let inputs = read_hex_inputs()?;
    let [first, second, ..] = inputs.as_slice() else {
        bail!("expected two hex-encoded inputs, got {}", inputs.len());
    };

    let mutator = StructuredMutator::<T>::from_global();
    let crossed = mutator.cross_over(first, second, max_len, random_source(seed).next_u64());
    println!("{}", hex::encode(crossed));
    Ok(())
}

/// Chains `iterations` mutations starting from the default value and verifies the guarantees
/// every output must meet. Returns the number of mutations that changed the value.
fn check<T: Mutatable>(mut rand: RandomSource, max_len: usize, iterations: usize) -> anyhow::Result<usize> {
    ensure!(
        decode::<T>(&[]).equals(&T::default_value()),
        "the empty input does not decode to the default value"
    );

    let mutator = StructuredMutator::<T>::from_global();
    let mut data = encode(&T::default_value());
    data.truncate(max_len);
    let mut changed = 0;

    for iteration in 0..iterations {
        let mutation_seed = rand.next_u64();
        let output = mutator.mutate(&data, max_len, mutation_seed);

        ensure!(
            output.len() <= max_len,
            "iteration {iteration}: output of {} bytes exceeds the maximum of {max_len}",
            output.len()
        );
        ensure!(
            output == mutator.mutate(&data, max_len, mutation_seed),
            "iteration {iteration}: mutation with seed {mutation_seed} is not deterministic"
        );

        let value: T = decode(&output);
        let canonical = encode(&value);
        ensure!(
            canonical.len() == value.encoded_size(),
            "iteration {iteration}: encoded size {} disagrees with the encoding length {}",
            value.encoded_size(),
            canonical.len()
        );
        ensure!(
            decode::<T>(&canonical).equals(&value),
            "iteration {iteration}: value does not survive an encode/decode round trip"
        );

        if !value.equals(&decode::<T>(&data)) {
            changed += 1;
        }
        data = output;
    }

    Ok(changed)
}

fn check_command<T: Mutatable>(seed: Option<u64>, max_len: usize, iterations: usize) -> anyhow::Result<()> {
    let changed = check::<T>(random_source(seed), max_len, iterations)?;
    tracing::info!(iterations, changed, "all checks passed");
    println!("ok: {iterations} mutations, {changed} changed the value");
    Ok(())
}

fn run<T: Mutatable + Debug>(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Decode => decode_command::<T>(),
        Commands::Mutate {
            seed,
            max_len,
            rounds,
        } => mutate_command::<T>(seed, max_len, rounds),
        Commands::CrossOver { seed, max_len } => cross_over_command::<T>(seed, max_len),
        Commands::Check {
            seed,
            max_len,
            iterations,
        } => check_command::<T>(seed, max_len, iterations),
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cmd::parse();
    match cli.schema {
        Schema::Envelope => run::<Envelope>(cli.command),
        Schema::Message => run::<Message>(cli.command),
        Schema::Transaction => run::<Transaction>(cli.command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passes_for_every_schema() {
        assert!(check::<Envelope>(RandomSource::new(1), 512, 300).unwrap() > 0);
        assert!(check::<Message>(RandomSource::new(2), 512, 300).unwrap() > 0);
        assert!(check::<Transaction>(RandomSource::new(3), 512, 300).unwrap() > 0);
    }

    #[test]
    fn test_explicit_seed_is_reproducible() {
        assert_eq!(random_source(Some(7)).next_u64(), RandomSource::new(7).next_u64());
    }

    #[test]
    fn test_check_with_tiny_limit() {
        // Every output is truncated to a handful of bytes and must still decode
        check::<Envelope>(RandomSource::new(4), 3, 100).unwrap();
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cmd::try_parse_from(["structser-cmd", "mutate", "--seed", "7", "--schema", "message"])
            .unwrap();
        assert!(matches!(cli.schema, Schema::Message));
        assert!(matches!(
            cli.command,
            Commands::Mutate {
                seed: Some(7),
                max_len: 4096,
                rounds: 1
            }
        ));
    }
}
