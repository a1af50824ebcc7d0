use kube::CustomResourceExt;
use serverless_operator::crd::serving::KnativeServing;

fn main() -> anyhow::Result<()> {
    // The Ingress and Route CRDs ship with Knative and OpenShift; only the
    // KnativeServing schema is owned here.
    // Pipe through `yq -P` for YAML.
    let crd = serde_json::to_string_pretty(&KnativeServing::crd())?;
    println!("{}", crd);
    Ok(())
}
