//! Self-contained HTML report
//!
//! All user-supplied text (factor names, messages) is escaped before
//! `**bold**` markers are turned into `<strong>` tags.

use std::fmt::Write;

use crate::analysis::AnalysisReport;
use crate::error::ExportError;
use crate::factors::{FactorEffect, Medal, ProtectiveFactorResult};
use crate::pacing::PacingState;
use crate::sleep::SleepOutcome;

const STYLE: &str = "body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; margin: 0; padding: 20px; }
.container { max-width: 960px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; }
h1 { color: #333; border-bottom: 3px solid #2D7DD2; padding-bottom: 10px; }
h2 { color: #555; margin-top: 30px; }
.stats { display: flex; flex-wrap: wrap; gap: 15px; margin: 20px 0; }
.stat-card { flex: 1; min-width: 150px; background: #f9f9f9; padding: 20px; border-radius: 8px; text-align: center; }
.stat-value { font-size: 32px; font-weight: bold; color: #2D7DD2; }
.stat-label { color: #666; font-size: 14px; margin-top: 5px; }
.insight { font-size: 16px; line-height: 1.6; color: #444; }
.protective-box, .sleep-box { background: #F3E5F5; padding: 20px; border-radius: 8px; margin: 20px 0; }
.sleep-box { background: #E3F2FD; }
.factor-item { display: flex; align-items: center; padding: 12px; border-bottom: 1px solid #eee; }
.factor-rank { font-size: 24px; width: 50px; }
.factor-name { font-weight: bold; color: #333; font-size: 16px; }
.factor-stats { color: #666; font-size: 13px; margin-top: 3px; }
.reduction-badge { color: white; padding: 3px 8px; border-radius: 12px; font-size: 12px; font-weight: bold; margin-left: 10px; }
.best-days-grid { display: flex; gap: 15px; margin: 20px 0; }
.day-card { flex: 1; border: 2px solid #ddd; border-radius: 8px; padding: 15px; text-align: center; }
.day-card.gold { border-color: #FFD700; background: #FFFDE7; }
.day-date { font-weight: bold; color: #333; font-size: 14px; }
.day-tnl { font-size: 28px; font-weight: bold; color: #4CAF50; }
.day-tics { color: #666; font-size: 13px; }
.day-factors { font-size: 12px; color: #9C27B0; margin-top: 8px; }
.chart svg { width: 100%; height: auto; }";

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape a message and convert `**bold**` pairs to `<strong>`
///
/// An unmatched trailing `**` is kept literally.
pub fn emphasize(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped.as_str();

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        match after_open.find("**") {
            Some(close) if close > 0 => {
                out.push_str(&rest[..open]);
                out.push_str("<strong>");
                out.push_str(&after_open[..close]);
                out.push_str("</strong>");
                rest = &after_open[close + 2..];
            }
            _ => break,
        }
    }
    out.push_str(rest);
    out
}

/// Emphasize, then map blank lines to paragraphs and line breaks to `<br>`
fn paragraphs(text: &str) -> String {
    emphasize(text)
        .replace("\n\n", "</p><p class='insight' style='margin-top: 15px;'>")
        .replace('\n', "<br>")
}

fn pacing_color(state: PacingState) -> &'static str {
    match state {
        PacingState::GreenLight => "#4CAF50",
        PacingState::HighLoadWarning => "#FF9800",
        _ => "#F44336",
    }
}

fn badge_color(reduction: f64) -> &'static str {
    if reduction > 15.0 {
        "#4CAF50"
    } else if reduction > 5.0 {
        "#FF9800"
    } else {
        "#9E9E9E"
    }
}

/// Render the report as one HTML document
pub fn render_report(report: &AnalysisReport) -> Result<String, ExportError> {
    let mut html = String::new();
    write_document(&mut html, report).map_err(|e| ExportError::Serialization(e.to_string()))?;
    Ok(html)
}

fn write_document(html: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    let color = pacing_color(report.pacing.state);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html>\n<head>\n<meta charset='UTF-8'>")?;
    writeln!(html, "<title>MyFlow Wellness Report</title>")?;
    writeln!(
        html,
        "<style>\n{}\n.pacing-box {{ padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 5px solid {}; background: {}22; }}\n</style>",
        STYLE, color, color
    )?;
    writeln!(html, "</head>\n<body>\n<div class='container'>")?;
    writeln!(html, "<h1>📊 Your MyFlow Wellness Report</h1>")?;

    if let Some(range) = &report.date_range {
        writeln!(
            html,
            "<p style='color: #666;'>{} to {} • {} days logged</p>",
            range.start.format("%b %d, %Y"),
            range.end.format("%b %d, %Y"),
            report.days_analyzed
        )?;
    }

    writeln!(html, "<div class='pacing-box'>")?;
    writeln!(html, "<h2 style='margin-top: 0;'>{}</h2>", report.pacing.state.label())?;
    writeln!(html, "<p class='insight'>{}</p>", paragraphs(&report.pacing.message))?;
    writeln!(html, "</div>")?;

    write_chart(html, report)?;
    write_protective_factors(html, &report.protective_factors)?;
    write_sleep(html, &report.sleep)?;

    writeln!(
        html,
        "<p style='margin-top: 40px; color: #999; font-size: 12px; text-align: center;'>Generated by MyFlow on {}</p>",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(html, "</div>\n</body>\n</html>")?;
    Ok(())
}

#[cfg(feature = "charts")]
fn write_chart(html: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    if report.contributions.is_empty() {
        return Ok(());
    }
    writeln!(html, "<h2>📈 What's Affecting Your Tics?</h2>")?;
    writeln!(
        html,
        "<p style='color: #666;'>Things above the line add load. Things below the line help reduce it. The red line is your tic count.</p>"
    )?;
    match super::chart::render_svg(&report.contributions) {
        Ok(svg) => writeln!(html, "<div class='chart'>{}</div>", svg),
        Err(e) => {
            tracing::warn!(error = %e, "Chart rendering failed, omitting chart");
            Ok(())
        }
    }
}

#[cfg(not(feature = "charts"))]
fn write_chart(_html: &mut String, _report: &AnalysisReport) -> std::fmt::Result {
    Ok(())
}

fn write_protective_factors(html: &mut String, result: &ProtectiveFactorResult) -> std::fmt::Result {
    writeln!(html, "<h2>🛡️ What's Working FOR YOU</h2>")?;
    writeln!(
        html,
        "<div class='protective-box'>\n<p class='insight'>{}</p>\n</div>",
        paragraphs(&result.insight_message)
    )?;

    if let Some(best) = &result.best_factor {
        write_best_factor(html, best)?;
    }

    if !result.ranked_factors.is_empty() {
        writeln!(html, "<h3 style='color: #555; margin-top: 25px;'>📋 Your Protective Factor Ranking</h3>")?;
        writeln!(html, "<div class='factor-ranking'>")?;
        for (i, factor) in result.ranked_factors.iter().enumerate() {
            let marker = Medal::for_rank(i + 1)
                .map(|m| m.emoji().to_string())
                .unwrap_or_else(|| format!("#{}", i + 1));
            writeln!(
                html,
                "<div class='factor-item'>\n<div class='factor-rank'>{}</div>\n<div class='factor-details'>\n\
                 <div class='factor-name'>{}<span class='reduction-badge' style='background: {};'>{:.0}% reduction</span></div>\n\
                 <div class='factor-stats'>Used {}x • Avg {:.1} tics with • {:.1} tics without</div>\n</div>\n</div>",
                marker,
                escape_html(&factor.name),
                badge_color(factor.tic_reduction_pct),
                factor.tic_reduction_pct,
                factor.times_used,
                factor.avg_tics_with,
                factor.avg_tics_without
            )?;
        }
        writeln!(html, "</div>")?;
    }

    if !result.top_best_days.is_empty() {
        writeln!(html, "<h2>🌟 Your Best Days (Lowest TNL)</h2>")?;
        writeln!(html, "<div class='best-days-grid'>")?;
        for day in &result.top_best_days {
            let card_class = if day.medal == Some(Medal::Gold) {
                "day-card gold"
            } else {
                "day-card"
            };
            let marker = day
                .medal
                .map(|m| m.emoji().to_string())
                .unwrap_or_else(|| format!("#{}", day.rank));
            let what_helped = if day.protective_factors.is_empty() {
                "Natural good day!".to_string()
            } else {
                escape_html(&day.protective_factors.join(", "))
            };
            writeln!(
                html,
                "<div class='{}'>\n<div class='day-date'>{} {}</div>\n<div class='day-tnl'>{:.1}</div>\n\
                 <div class='day-tics'>TNL Score • {} tics</div>\n<div class='day-factors'>✨ {}</div>\n</div>",
                card_class,
                marker,
                day.date.format("%b %d"),
                day.tnl,
                day.tic_count,
                what_helped
            )?;
        }
        writeln!(html, "</div>")?;
    }
    Ok(())
}

fn write_best_factor(html: &mut String, best: &FactorEffect) -> std::fmt::Result {
    let name = escape_html(&best.name);
    writeln!(html, "<div class='stats'>")?;
    writeln!(
        html,
        "<div class='stat-card' style='background: #F3E5F5;'><div class='stat-value' style='color: #9C27B0;'>🏆</div>\
         <div class='stat-label'><strong>{}</strong><br>Your #1 Protective Factor</div></div>",
        name
    )?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value' style='color: #4CAF50;'>{:.0}%</div>\
         <div class='stat-label'>Tic Reduction<br>When You Use It</div></div>",
        best.tic_reduction_pct
    )?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value'>{:.1}</div><div class='stat-label'>Avg Tics WITH<br>{}</div></div>",
        best.avg_tics_with, name
    )?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value' style='color: #F44336;'>{:.1}</div>\
         <div class='stat-label'>Avg Tics WITHOUT<br>{}</div></div>",
        best.avg_tics_without, name
    )?;
    writeln!(html, "</div>")
}

fn write_sleep(html: &mut String, sleep: &SleepOutcome) -> std::fmt::Result {
    writeln!(html, "<h2>😴 How Sleep Affects Your Tics</h2>")?;

    let result = match sleep {
        SleepOutcome::Analyzed(result) => result,
        SleepOutcome::InsufficientData { message } => {
            return writeln!(
                html,
                "<div class='sleep-box'>\n<p class='insight'>{}</p>\n</div>",
                escape_html(message)
            );
        }
    };

    writeln!(
        html,
        "<div class='sleep-box'>\n<p class='insight'>{}</p>\n</div>",
        escape_html(&result.insight_message)
    )?;
    writeln!(html, "<div class='stats'>")?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value'>{:.1}</div><div class='stat-label'>Hours of Sleep Per Night</div></div>",
        result.avg_sleep_hours
    )?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value'>{:.2}</div>\
         <div class='stat-label'>Sleep-Tic Connection<br><span style='font-size: 11px;'>(-1 = more sleep helps a lot!)</span></div></div>",
        result.correlation_coefficient
    )?;
    writeln!(
        html,
        "<div class='stat-card'><div class='stat-value'>{:.1}</div><div class='stat-label'>Your Optimal Sleep (hours)</div></div>",
        result.optimal_sleep_hours
    )?;

    match (
        result.avg_tics_good_sleep,
        result.avg_tics_bad_sleep,
        result.percent_difference,
    ) {
        (Some(good), Some(bad), Some(pct)) if pct != 0.0 => {
            writeln!(
                html,
                "<div class='stat-card'><div class='stat-value'>{:.0}%</div><div class='stat-label'>Difference With Good Sleep</div></div>",
                pct
            )?;
            writeln!(html, "</div>")?;
            writeln!(html, "<h2>😴 Good Sleep vs. Bad Sleep</h2>")?;
            writeln!(html, "<div class='stats'>")?;
            writeln!(
                html,
                "<div class='stat-card' style='background: #FFEBEE;'><div class='stat-value' style='color: #F44336;'>{:.1}</div>\
                 <div class='stat-label'>Average Tics<br>(Far From Your Optimal Sleep)</div></div>",
                bad
            )?;
            writeln!(
                html,
                "<div class='stat-card' style='background: #E8F5E9;'><div class='stat-value' style='color: #4CAF50;'>{:.1}</div>\
                 <div class='stat-label'>Average Tics<br>(Near Your Optimal Sleep)</div></div>",
                good
            )?;
            writeln!(html, "</div>")
        }
        _ => writeln!(html, "</div>"),
    }
}
