use tickerlens_core::domain::report::{AnalysisReport, PriceLevel, SeriesPoint};

pub fn render_text(report: &AnalysisReport, currency: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let money = |v: f64| format!("{currency} {v:.2}");

    out.push(format!("Analyst-Based Stock Analysis: {}", report.symbol));
    out.push(String::new());

    section(&mut out, "Company Overview");
    let overview = &report.overview;
    out.push(format!("• Company Name: {}", overview.name));
    out.push(format!("• Sector: {}", overview.sector));
    out.push(format!("• Industry: {}", overview.industry));
    out.push("What the company does:".to_string());
    for point in &overview.summary_points {
        out.push(format!("  • {point}"));
    }
    out.push(String::new());

    section(&mut out, "Price History");
    out.push(format!("Price:  {}", series_summary(&report.price_series)));
    out.push(format!("Volume: {}", series_summary(&report.volume_series)));
    out.push(String::new());

    section(&mut out, "Financial Overview");
    let fin = &report.financials;
    out.push(format!("• Current Price: {}", money(fin.current_price)));
    out.push(format!("• 52-Week High: {}", money(fin.fifty_two_week_high)));
    out.push(format!("• 52-Week Low: {}", money(fin.fifty_two_week_low)));
    out.push(format!("• Market Capitalization: {}", fin.market_cap_display));
    out.push(String::new());

    section(&mut out, "Shareholding Pattern (%)");
    for bar in &report.shareholding.bars {
        out.push(format!("• {}: {}", bar.label, bar.text));
    }
    if report.shareholding.inconsistent {
        out.push("  (provider holdings exceed 100%; public share shown as reported)".to_string());
    }
    out.push(String::new());

    section(&mut out, "Price Targets & Stop Loss");
    if let Some(consensus) = &report.analyst_consensus {
        out.push("Targets from Analyst Consensus:".to_string());
        out.push(consensus_line("Target (Low)", &consensus.low, &money));
        out.push(consensus_line("Target (Mean)", &consensus.mean, &money));
        out.push(consensus_line("Target (High)", &consensus.high, &money));
        out.push(String::new());
    }
    let refined = &report.refined_targets;
    out.push("Refined Targets (Risk Managed):".to_string());
    out.push(refined_line("Target 1", &refined.target1, &money));
    out.push(refined_line("Target 2", &refined.target2, &money));
    out.push(refined_line("Target 3", &refined.target3, &money));
    out.push(format!(
        "• Stop Loss: {} ({:.1}% {})",
        money(refined.stop_loss.price),
        refined.stop_loss.pct_from_current,
        refined.stop_loss.horizon
    ));
    out.push(String::new());

    section(&mut out, "Investment Confidence");
    let rec = &report.recommendation;
    out.push(format!("• Suggestion: {}", rec.label));
    out.push(format!("• Confidence Level: {}%", rec.confidence_percent));
    out.push("Basis:".to_string());
    for basis in &rec.basis {
        out.push(format!("  • {basis}"));
    }
    out.push(String::new());

    section(&mut out, "Latest Market News");
    if let Some(notice) = &report.news_notice {
        out.push(notice.clone());
    }
    for n in &report.news {
        out.push(format!("• {}", n.title));
        out.push(format!("  {}", n.published));
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn section(out: &mut Vec<String>, title: &str) {
    out.push(title.to_string());
    out.push("-".repeat(title.chars().count()));
}

fn consensus_line(name: &str, level: &PriceLevel, money: &dyn Fn(f64) -> String) -> String {
    format!(
        "• {name}: {} ({:.1}% from current price, {})",
        money(level.price),
        level.pct_from_current,
        level.horizon
    )
}

fn refined_line(name: &str, level: &PriceLevel, money: &dyn Fn(f64) -> String) -> String {
    format!(
        "• {name}: {} ({:+.1}%, most likely in {})",
        money(level.price),
        level.pct_from_current,
        level.horizon
    )
}

fn series_summary(points: &[SeriesPoint]) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return "no data".to_string();
    };
    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    format!(
        "{} points, {} to {}, min {:.2}, max {:.2}, last {:.2}",
        points.len(),
        first.date,
        last.date,
        min,
        max,
        last.value
    )
}
