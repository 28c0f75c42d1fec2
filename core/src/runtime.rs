//! Process-wide rayon pool setup.

use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

/// Environment variable consulted when no explicit thread count is given.
pub const CPU_THREADS_ENV: &str = "SORTER_CPU_THREADS";

static POOL: OnceLock<Result<usize, String>> = OnceLock::new();

/// Configure the global rayon pool that runs per-cluster work.
///
/// The thread count is `num_threads` if given, else [`CPU_THREADS_ENV`], else the
/// rayon default. Only the first call does anything; later calls get its result.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<(), String> {
    POOL.get_or_init(|| {
        let requested = match num_threads {
            Some(n) => Some(n),
            None => match env::var(CPU_THREADS_ENV) {
                Ok(raw) => Some(parse_cpu_threads(&raw)?),
                Err(env::VarError::NotPresent) => None,
                Err(e) => return Err(format!("failed to read {CPU_THREADS_ENV}: {e}")),
            },
        };

        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = requested {
            if n == 0 {
                return Err("thread count must be >= 1".to_string());
            }
            builder = builder.num_threads(n);
        }
        builder.build_global().map_err(|e| e.to_string())?;
        Ok(rayon::current_num_threads())
    })
    .clone()
    .map(|_| ())
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn parse_cpu_threads(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(format!("{CPU_THREADS_ENV} must be >= 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(format!(
            "{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"
        )),
    }
}
