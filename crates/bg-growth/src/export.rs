//! CSV export of the final network.
//!
//! Two tables, both keyed by the network's external node ids:
//! - edges: `edge,u,v,length,existing,generated`
//! - nodes: `id,x,y,poi,existing`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use bg_spatial::WeightedNetwork;

use crate::expand::FinalNetwork;
use crate::GrowthResult;

/// Write the edge table of `result` to `out`.
pub fn write_final_csv<W: Write>(
    out: W,
    network: &WeightedNetwork,
    result: &FinalNetwork,
) -> GrowthResult<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["edge", "u", "v", "length", "existing", "generated"])?;
    for edge in &result.edges {
        writer.write_record(&[
            edge.edge.0.to_string(),
            network.node_external[edge.a.index()].to_string(),
            network.node_external[edge.b.index()].to_string(),
            edge.length.to_string(),
            (edge.provenance.existing as u8).to_string(),
            (edge.provenance.generated as u8).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the node table of `result` to `out`.
pub fn write_final_nodes_csv<W: Write>(
    out: W,
    network: &WeightedNetwork,
    result: &FinalNetwork,
) -> GrowthResult<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["id", "x", "y", "poi", "existing"])?;
    for &node in &result.nodes {
        let i = node.index();
        let pos = network.node_pos[i];
        writer.write_record(&[
            network.node_external[i].to_string(),
            pos.x.to_string(),
            pos.y.to_string(),
            (network.node_poi[i] as u8).to_string(),
            (network.node_in_existing[i] as u8).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `final_nodes.csv` and `final_edges.csv` into `dir`.
pub fn write_final_dir(dir: &Path, network: &WeightedNetwork, result: &FinalNetwork) -> GrowthResult<()> {
    write_final_nodes_csv(File::create(dir.join("final_nodes.csv"))?, network, result)?;
    write_final_csv(File::create(dir.join("final_edges.csv"))?, network, result)?;
    log::info!("wrote final network to {}", dir.display());
    Ok(())
}
