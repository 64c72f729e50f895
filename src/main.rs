use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use skyharmonics::healpix::{self, PixelOrdering};
use skyharmonics::{Alm, alm2map, interpolation_weights, map2alm, query_disc};

#[derive(Parser)]
#[command(
    name = "skyharmonics",
    about = "HEALPix pixel queries and spherical harmonic transforms"
)]
struct Cli {
    /// Worker threads for the transforms (rayon default if omitted).
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderingArg {
    Ring,
    Nested,
}

impl From<OrderingArg> for PixelOrdering {
    fn from(o: OrderingArg) -> Self {
        match o {
            OrderingArg::Ring => PixelOrdering::Ring,
            OrderingArg::Nested => PixelOrdering::Nested,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the geometry of a resolution.
    Info {
        #[arg(long)]
        nside: u64,
    },

    /// Pixel index containing a position.
    Ang2pix {
        #[arg(long)]
        nside: u64,

        #[arg(long, value_enum, default_value = "ring")]
        ordering: OrderingArg,

        /// Colatitude in degrees.
        theta: f64,

        /// Longitude in degrees.
        phi: f64,
    },

    /// Centre of a pixel.
    Pix2ang {
        #[arg(long)]
        nside: u64,

        #[arg(long, value_enum, default_value = "ring")]
        ordering: OrderingArg,

        pix: u64,
    },

    /// Convert a pixel index between orderings.
    Convert {
        #[arg(long)]
        nside: u64,

        #[arg(long, value_enum)]
        from: OrderingArg,

        #[arg(long, value_enum)]
        to: OrderingArg,

        pix: u64,
    },

    /// Pixels whose centres lie within a disc.
    QueryDisc {
        #[arg(long)]
        nside: u64,

        #[arg(long, value_enum, default_value = "ring")]
        ordering: OrderingArg,

        /// Colatitude of the disc centre in degrees.
        theta: f64,

        /// Longitude of the disc centre in degrees.
        phi: f64,

        /// Disc radius in degrees.
        radius: f64,

        /// Also return pixels that only overlap the disc.
        #[arg(long)]
        inclusive: bool,
    },

    /// Interpolate a single harmonic Y_lm sampled on the grid.
    Interpolate {
        #[arg(long)]
        nside: u64,

        #[arg(long, default_value = "2")]
        l: usize,

        #[arg(long, default_value = "1")]
        m: usize,

        /// Colatitude in degrees.
        theta: f64,

        /// Longitude in degrees.
        phi: f64,
    },

    /// Random band-limited coefficients through alm2map and map2alm.
    Roundtrip {
        #[arg(long, default_value = "16")]
        nside: u64,

        /// Band limit (defaults to nside).
        #[arg(long)]
        lmax: Option<usize>,

        /// Largest number of refinement iterations to report.
        #[arg(long, default_value = "5")]
        iterations: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn exit_on_error<T>(result: skyharmonics::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn cmd_info(nside: u64) {
    exit_on_error(healpix::validate_nside(nside, PixelOrdering::Ring));
    let area = healpix::pixel_area(nside);
    println!("nside:        {nside}");
    println!("npix:         {}", healpix::npix(nside));
    println!("nring:        {}", exit_on_error(healpix::nring(nside)));
    println!(
        "pixel area:   {:.6e} sr ({:.4} arcmin^2)",
        area,
        area * (180.0 * 60.0 / std::f64::consts::PI).powi(2)
    );
    println!(
        "max pixrad:   {:.6} deg",
        healpix::max_pixrad(nside).to_degrees()
    );
    println!("nested ok:    {}", nside.is_power_of_two());
}

fn cmd_interpolate(nside: u64, l: usize, m: usize, theta: f64, phi: f64) {
    let mut alm = exit_on_error(Alm::<f64>::zeros(l, m.min(l)));
    exit_on_error(alm.set(l, m, Complex64::new(1.0, 0.0)));
    let map = exit_on_error(alm2map(&alm, nside));

    let value = exit_on_error(map.interpolate(theta, phi));
    let nearest = exit_on_error(map.value_at(theta, phi));
    let weights = exit_on_error(interpolation_weights(
        map.nside(),
        map.ordering(),
        theta,
        phi,
    ));
    println!("interpolated: {value:.10}");
    println!("nearest:      {nearest:.10}");
    for (p, w) in weights.pixels.iter().zip(&weights.weights) {
        println!("  pixel {p:>10}  weight {w:.6}");
    }
}

fn cmd_roundtrip(nside: u64, lmax: usize, iterations: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let alm = exit_on_error(Alm::from_fn(lmax, lmax, |_, m| {
        let re = rng.random_range(-1.0..1.0);
        let im = if m == 0 {
            0.0
        } else {
            rng.random_range(-1.0..1.0)
        };
        Complex64::new(re, im)
    }));

    let start = Instant::now();
    let map = exit_on_error(alm2map(&alm, nside));
    info!(elapsed = ?start.elapsed(), "synthesized map");

    println!("nside = {nside}, lmax = mmax = {lmax}");
    println!("{:>10}  {:>14}  {:>10}", "iterations", "max |error|", "seconds");
    for iter in 0..=iterations {
        let start = Instant::now();
        let recovered = exit_on_error(map2alm(&map, lmax, lmax, iter));
        let elapsed = start.elapsed().as_secs_f64();
        let err = recovered
            .coefficients()
            .iter()
            .zip(alm.coefficients())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        println!("{iter:>10}  {err:>14.3e}  {elapsed:>10.3}");
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Failed to configure thread pool: {e}");
            process::exit(1);
        }
    }

    match &cli.command {
        Commands::Info { nside } => cmd_info(*nside),
        Commands::Ang2pix {
            nside,
            ordering,
            theta,
            phi,
        } => {
            let pix = exit_on_error(healpix::ang2pix(
                *nside,
                (*ordering).into(),
                theta.to_radians(),
                phi.to_radians(),
            ));
            println!("{pix}");
        }
        Commands::Pix2ang {
            nside,
            ordering,
            pix,
        } => {
            let (theta, phi) = exit_on_error(healpix::pix2ang(*nside, (*ordering).into(), *pix));
            println!("{:.10} {:.10}", theta.to_degrees(), phi.to_degrees());
        }
        Commands::Convert {
            nside,
            from,
            to,
            pix,
        } => {
            let out = exit_on_error(healpix::convert(*nside, (*from).into(), (*to).into(), *pix));
            println!("{out}");
        }
        Commands::QueryDisc {
            nside,
            ordering,
            theta,
            phi,
            radius,
            inclusive,
        } => {
            let pixels = exit_on_error(query_disc(
                *nside,
                (*ordering).into(),
                theta.to_radians(),
                phi.to_radians(),
                radius.to_radians(),
                *inclusive,
            ));
            eprintln!("{} pixels", pixels.len());
            for p in pixels {
                println!("{p}");
            }
        }
        Commands::Interpolate {
            nside,
            l,
            m,
            theta,
            phi,
        } => cmd_interpolate(*nside, *l, *m, theta.to_radians(), phi.to_radians()),
        Commands::Roundtrip {
            nside,
            lmax,
            iterations,
            seed,
        } => cmd_roundtrip(
            *nside,
            lmax.unwrap_or(*nside as usize),
            *iterations,
            *seed,
        ),
    }
}
