use crate::core::nn::network::Network;

/// Human-readable table of a network's layers and parameter budget.
pub fn network_summary(network: &Network) -> String {
    let total_params = network.parameter_count();
    let memory_bytes = total_params * std::mem::size_of::<f64>();

    let mut out = String::new();
    out.push_str("===== Network Summary =====\n");
    for (i, layer) in network.layers().iter().enumerate() {
        out.push_str(&format!(
            "{i:>2}  {:<8} {:>5} -> {:<5} params: {}\n",
            layer.name(),
            layer.input_size(),
            layer.output_size(),
            layer.parameter_count()
        ));
    }
    out.push_str(&format!("Total parameters:     {total_params}\n"));
    out.push_str(&format!("Memory estimate:      {} bytes", memory_bytes));

    if memory_bytes >= 1024 * 1024 {
        let mb = memory_bytes as f64 / (1024.0 * 1024.0);
        out.push_str(&format!(" ({mb:.2} MB)"));
    } else if memory_bytes >= 1024 {
        let kb = memory_bytes as f64 / 1024.0;
        out.push_str(&format!(" ({kb:.2} KB)"));
    }

    out.push('\n');
    out.push_str("===========================");
    out
}
