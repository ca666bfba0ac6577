//! Offline land-mask sampler
//!
//! Enumerates the provider's native grid over the Americas, keeps the points
//! on land and prints them as CSV to stdout, with the total on stderr via the
//! log. Run once to produce a collectable-points list; no network or database
//! access involved.

use roaring_landmask::RoaringLandmask;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::sampling::{land_points, GridSpec};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "map_collectable_points=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    pyo3::prepare_freethreaded_python();
    let mask = pyo3::Python::with_gil(RoaringLandmask::new)?;
    let spec = GridSpec::default();
    tracing::info!(
        lat_step = spec.lat_step,
        lon_step = spec.lon_step,
        "scanning grid"
    );

    let points = land_points(&spec, |lon, lat| mask.contains(lon, lat));

    println!("lat,lon");
    for point in &points {
        println!("{},{}", point.lat, point.lon);
    }

    tracing::info!(count = points.len(), "land points found");
    Ok(())
}
