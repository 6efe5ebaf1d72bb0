use crate::cli::ProvideArgs;
use crate::error::{ErrorKind, Result};
use deken_provider::{Catalog, Filter, Package, Row};
use exn::ResultExt;

/// Library-source rows for every system-packaged external matching the
/// arguments.
pub async fn rows(args: &ProvideArgs) -> Result<Vec<Row>> {
    let unreadable = || ErrorKind::Packages(args.packages.clone());
    let bytes = tokio::fs::read(&args.packages).await.or_raise(unreadable)?;
    let packages: Vec<Package> = serde_json::from_slice(&bytes).or_raise(unreadable)?;
    let filter = Filter {
        architecture: args.architecture.clone(),
        float_size: args.float_size,
    };
    let catalog = Catalog::build(&packages, &filter);
    let matches = catalog.matching(&args.patterns).or_raise(|| ErrorKind::Provider)?;
    tracing::debug!(packages = packages.len(), matches = matches.len(), "Package list searched");
    Ok(matches
        .into_iter()
        .map(|found| Row::new(found, args.float_size, &args.fallback_origin, args.fallback_release.as_deref()))
        .collect())
}
