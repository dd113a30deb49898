//! Prime generator demo
//!
//! Runs an unbounded incremental sieve on a producer thread and prints the
//! first N odd primes, then cancels the producer and prints its final status.
//!
//! Usage: `cargo run --features demo --bin primes -- [COUNT]` (default 20).
//! Set `RUST_LOG=debug` to watch the cancellation handshake.

use rendezvous_future::{CancelToken, Config, Emitter, Future, FutureError};
use std::collections::HashMap;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: usize = 20;

/// Incremental sieve of Eratosthenes over odd numbers.
///
/// `table` maps each upcoming odd composite to the prime that produced it.
struct Sieve {
    table: HashMap<u64, u64>,
    q: u64,
}

impl Sieve {
    fn new() -> Self {
        Self {
            table: HashMap::new(),
            q: 3,
        }
    }

    /// Advances to the next odd prime.
    ///
    /// Fails once the square of the next prime no longer fits in a `u64`.
    fn next_prime(&mut self) -> Result<u64, FutureError> {
        loop {
            let q = self.q;
            self.q += 2;
            match self.table.remove(&q) {
                None => {
                    let square = q
                        .checked_mul(q)
                        .ok_or_else(|| FutureError::msg(format!("sieve overflow at {q}")))?;
                    self.table.insert(square, q);
                    return Ok(q);
                }
                Some(p) => {
                    // Next odd multiple of p not already claimed.
                    let mut x = q + 2 * p;
                    while self.table.contains_key(&x) {
                        x += 2 * p;
                    }
                    self.table.insert(x, p);
                }
            }
        }
    }
}

/// Producer: sends primes until a send fails or the sieve overflows.
fn gen_primes(emitter: &Emitter<u64>) -> Result<(), FutureError> {
    let mut sieve = Sieve::new();
    loop {
        emitter.send(sieve.next_prime()?)?;
    }
}

/// Takes the first `n` primes, then cancels. Returns them with the final status.
fn first_primes(n: usize) -> std::io::Result<(Vec<u64>, Option<FutureError>)> {
    let config = Config::default().with_thread_name("sieve");
    let future = Future::with_config(&CancelToken::new(), &config, gen_primes)?;

    let mut primes = Vec::with_capacity(n);
    for p in &future {
        if primes.len() >= n {
            future.cancel();
            break;
        }
        primes.push(p);
    }

    Ok((primes, future.last_error()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let count = match std::env::args().nth(1) {
        None => DEFAULT_COUNT,
        Some(arg) => match arg.parse() {
            Ok(n) => n,
            Err(e) => {
                eprintln!("invalid count {arg:?}: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let (primes, status) = match first_primes(count) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("failed to start producer: {e}");
            return ExitCode::FAILURE;
        }
    };

    for p in primes {
        println!("{p}");
    }
    match status {
        Some(err) => println!("{err}"),
        None => println!("ok"),
    }
    ExitCode::SUCCESS
}
