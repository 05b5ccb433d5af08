//! Prints the ScyllaDBDatacenter CRD manifest as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > deploy/crds/scylladbdatacenters.yaml`

use crds::ScyllaDBDatacenter;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&ScyllaDBDatacenter::crd())?);
    Ok(())
}
