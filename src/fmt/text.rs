use crate::domain::ntp::ProbeResult;
use crate::ntp::tables::stratum_to_text;
use crate::stats::Stats;
use console::style;

/// Render a probe result into human readable text.
pub fn render_probe(r: &ProbeResult, verbose: bool) -> String {
    let mut out = format!(
        "{srv_lbl} {srv_val}\n\
         {ip_lbl} {ip_val}:{port}\n\
         {utc_lbl} {utc_val}\n\
         {loc_lbl} {loc_val}\n\
         {off_lbl} {off_val:.3} ms\n\
         {rtt_lbl} {rtt_val:.3} ms",
        srv_lbl = style("Server:").cyan().bold(),
        srv_val = style(&r.target.name).green(),
        ip_lbl = style("IP:").cyan().bold(),
        ip_val = style(r.target.ip).green(),
        port = r.target.port,
        utc_lbl = style("UTC Time:").cyan().bold(),
        utc_val = style(r.utc.to_rfc2822()).green(),
        loc_lbl = style("Local Time:").cyan().bold(),
        loc_val = style(r.local.format("%Y-%m-%d %H:%M:%S%.3f")).green(),
        off_lbl = style("Clock Offset:").cyan().bold(),
        off_val = r.offset_ms,
        rtt_lbl = style("Round Trip Delay:").cyan().bold(),
        rtt_val = r.rtt_ms,
    );

    if verbose {
        out.push_str(&format!(
            "\n{ver_lbl} {ver} ({mode})\n\
             {str_lbl} {str_val}\n\
             {ref_lbl} {ref_val}\n\
             {leap_lbl} {leap}\n\
             {poll_lbl} 2^{poll} s\n\
             {prec_lbl} 2^{prec} s\n\
             {rd_lbl} {rd:.3} ms\n\
             {rdisp_lbl} {rdisp:.3} ms",
            ver_lbl = style("Version:").cyan().bold(),
            ver = r.version,
            mode = r.mode,
            str_lbl = style("Stratum:").cyan().bold(),
            str_val = stratum_label(r.stratum),
            ref_lbl = style("Reference ID:").cyan().bold(),
            ref_val = r.ref_id,
            leap_lbl = style("Leap:").cyan().bold(),
            leap = r.leap,
            poll_lbl = style("Poll:").cyan().bold(),
            poll = r.poll,
            prec_lbl = style("Precision:").cyan().bold(),
            prec = r.precision,
            rd_lbl = style("Root Delay:").cyan().bold(),
            rd = r.root_delay_ms,
            rdisp_lbl = style("Root Dispersion:").cyan().bold(),
            rdisp = r.root_dispersion_ms,
        ));
    }

    out
}

fn stratum_label(stratum: u8) -> String {
    match stratum_to_text(stratum) {
        Ok(text) => format!("{stratum} ({text})"),
        Err(_) => format!("{stratum} (reserved)"),
    }
}

/// One line per probe, used by `--count` runs.
pub fn render_short_probe(r: &ProbeResult) -> String {
    format!(
        "{} [{}] offset {:.3} ms, rtt {:.3} ms",
        style(&r.target.name).green(),
        r.target.ip,
        r.offset_ms,
        r.rtt_ms
    )
}

/// Render comparison results line by line.
pub fn render_compare(results: &[ProbeResult], verbose: bool) -> String {
    let mut out = String::new();

    if results.len() == 2 {
        out.push_str(&format!(
            "{} {} and {}\n",
            style("Comparing").bold(),
            style(&results[0].target.name).green(),
            style(&results[1].target.name).green()
        ));
    } else {
        out.push_str(&format!(
            "{} {} servers\n",
            style("Comparing:").bold(),
            results.len()
        ));
    }

    for r in results {
        out.push_str(&format!(
            "{} [{}]: {}\n",
            style(&r.target.name).green().bold(),
            style(r.target.ip).blue(),
            style(format!("{:.3} ms", r.offset_ms)).yellow()
        ));

        if verbose {
            out.push_str(&format!(
                "  {} {}\n  {} {}\n  {} {:.3} ms\n",
                style("Stratum:").cyan().bold(),
                r.stratum,
                style("Reference ID:").cyan().bold(),
                r.ref_id,
                style("Round Trip Delay:").cyan().bold(),
                r.rtt_ms
            ));
        }
    }

    if results.is_empty() {
        return out;
    }

    let min = results
        .iter()
        .map(|r| r.offset_ms)
        .fold(f64::INFINITY, f64::min);
    let max = results
        .iter()
        .map(|r| r.offset_ms)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg = results.iter().map(|r| r.offset_ms).sum::<f64>() / results.len() as f64;

    out.push_str(&format!(
        "{} {:.3} ms (min: {:.3}, max: {:.3}, avg: {:.3})",
        style("Max drift:").cyan().bold(),
        max - min,
        min,
        max,
        avg
    ));

    out
}

/// Summary line for repeated probes of one server.
pub fn render_stats(name: &str, s: &Stats) -> String {
    format!(
        "{} {} samples, offset avg {:.3} ms (min {:.3}, max {:.3}), rtt avg {:.3} ms (min {:.3})",
        style(format!("{name}:")).cyan().bold(),
        s.count,
        s.offset_avg,
        s.offset_min,
        s.offset_max,
        s.rtt_avg,
        s.rtt_min
    )
}
