//! Plain-text rendering of recommendations, corpus statistics and tracks
//! for the terminal.
//!
//! Every function writes to a caller-supplied [`Write`] so output can be
//! captured in tests; the binary passes a locked stdout.

use crate::corpus::CorpusStats;
use crate::recommendation::{Direction, Recommendations, ScoredTrack};
use crate::track::Track;
use std::collections::BTreeMap;
use std::io::{self, Write};

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn direction_heading(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "UP   (raise energy)",
        Direction::Hold => "HOLD (keep energy)",
        Direction::Down => "DOWN (drop energy)",
    }
}

fn one_line(pick: &ScoredTrack) -> String {
    let t = &pick.track;
    format!(
        "{:<30} {:<20} {:>5.1} {:>4} E{:<2} {:.2}",
        truncate(&t.title, 30),
        truncate(&t.artist, 20),
        t.bpm,
        t.key_str(),
        t.energy,
        pick.total_score
    )
}

/// Renders all three buckets. With `explain`, each pick is followed by its
/// factor breakdown.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_recommendations(out: &mut dyn Write, recs: &Recommendations, explain: bool) -> io::Result<()> {
    let cur = &recs.current_track;
    writeln!(out, "Now playing: {cur}")?;
    writeln!(
        out,
        "  {:.1} BPM | key {} | energy {} | {} | {}",
        cur.bpm,
        if cur.key_str().is_empty() { "?" } else { cur.key_str() },
        cur.energy,
        cur.vibe,
        cur.intensity
    )?;
    writeln!(
        out,
        "  {} of {} tracks passed the filters",
        recs.filtered_count, recs.candidates_considered
    )?;

    for direction in Direction::ALL {
        writeln!(out)?;
        writeln!(out, "{}", direction_heading(direction))?;
        let picks = recs.get(direction);
        if picks.is_empty() {
            writeln!(out, "  (no candidates)")?;
            continue;
        }
        for (i, pick) in picks.iter().enumerate() {
            writeln!(out, "  {}{} {}", direction.as_str().chars().next().unwrap_or('?'), i + 1, one_line(pick))?;
            if explain {
                for line in pick.explain().lines() {
                    writeln!(out, "      {line}")?;
                }
            }
        }
    }
    Ok(())
}

/// Renders effective factor weights.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_weights(out: &mut dyn Write, weights: &[(String, f64)]) -> io::Result<()> {
    for (name, weight) in weights {
        writeln!(out, "  {name:<22} {weight:.2}")?;
    }
    Ok(())
}

fn write_distribution<K: std::fmt::Display>(
    out: &mut dyn Write,
    title: &str,
    distribution: &BTreeMap<K, usize>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    let mut rows: Vec<_> = distribution.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1));
    for (key, count) in rows {
        writeln!(out, "  {key:<16} {count}")?;
    }
    Ok(())
}

/// Renders corpus statistics.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_stats(out: &mut dyn Write, stats: &CorpusStats) -> io::Result<()> {
    writeln!(out, "Corpus Statistics")?;
    writeln!(out, "  Total tracks: {}", stats.total_tracks)?;
    if let (Some(min), Some(max), Some(avg)) = (stats.bpm_min, stats.bpm_max, stats.bpm_avg) {
        writeln!(out, "  BPM range: {min:.0} - {max:.0} (avg: {avg:.1})")?;
    }

    writeln!(out)?;
    writeln!(out, "Energy Distribution")?;
    for (energy, count) in &stats.energy_distribution {
        writeln!(out, "  {energy:2}: {} ({count})", "#".repeat(*count))?;
    }

    write_distribution(out, "Vibe Distribution", &stats.vibe_distribution)?;
    write_distribution(out, "Intensity Distribution", &stats.intensity_distribution)?;
    write_distribution(out, "Key Distribution", &stats.key_distribution)?;
    write_distribution(out, "Genre Distribution", &stats.genre_distribution)?;
    write_distribution(out, "Vocals", &stats.vocal_distribution)?;

    writeln!(out)?;
    writeln!(out, "Quality")?;
    if let Some(q) = stats.avg_production_quality {
        writeln!(out, "  Avg production quality: {q:.1}/10")?;
    }
    if let Some(f) = stats.avg_audio_fidelity {
        writeln!(out, "  Avg audio fidelity: {f:.1}/10")?;
    }
    if stats.low_fidelity_count > 0 {
        writeln!(out, "  Low fidelity tracks: {}", stats.low_fidelity_count)?;
    }
    Ok(())
}

/// One row per track.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_track_table(out: &mut dyn Write, tracks: &[&Track]) -> io::Result<()> {
    writeln!(
        out,
        "{:<30} {:<20} {:>5} {:>4} {:>2} {:>2} {:<10} {:<8}",
        "Title", "Artist", "BPM", "Key", "E", "D", "Vibe", "Intensity"
    )?;
    for t in tracks {
        writeln!(
            out,
            "{:<30} {:<20} {:>5.0} {:>4} {:>2} {:>2} {:<10} {:<8}",
            truncate(&t.title, 30),
            truncate(&t.artist, 20),
            t.bpm,
            t.key_str(),
            t.energy,
            t.danceability,
            t.vibe,
            t.intensity
        )?;
    }
    Ok(())
}

/// Every attribute of one track, grouped.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_track_detail(out: &mut dyn Write, t: &Track) -> io::Result<()> {
    writeln!(out, "{}", t.title)?;
    writeln!(out, "{}", t.artist)?;

    writeln!(out, "\nAudio")?;
    writeln!(
        out,
        "  BPM: {:.1} | Key: {} | Duration: {:.0}s",
        t.bpm,
        t.key_str(),
        t.duration_seconds
    )?;

    writeln!(out, "\nEnergy")?;
    writeln!(out, "  Energy: {}/10 | Danceability: {}/10", t.energy, t.danceability)?;

    writeln!(out, "\nCharacter")?;
    writeln!(out, "  Vibe: {} | Intensity: {}", t.vibe, t.intensity)?;
    writeln!(out, "  Groove: {} | Tempo feel: {}", t.groove_style, t.tempo_feel)?;
    if !t.mood_tags.is_empty() {
        writeln!(out, "  Mood: {}", t.mood_tags.join(", "))?;
    }

    writeln!(out, "\nVocals")?;
    writeln!(out, "  Presence: {} | Style: {}", t.vocal_presence, t.vocal_style)?;
    if let Some(language) = &t.language {
        writeln!(out, "  Language: {language}")?;
    }

    writeln!(out, "\nMixability")?;
    writeln!(out, "  Mix in: {}/10 | Mix out: {}/10", t.mix_in_ease, t.mix_out_ease)?;
    if let Some(notes) = &t.mixability_notes {
        writeln!(out, "  Notes: {notes}")?;
    }

    writeln!(out, "\nProduction")?;
    writeln!(
        out,
        "  Quality: {}/10 | Fidelity: {}/10",
        t.production_quality, t.audio_fidelity
    )?;
    if !t.instrumentation.is_empty() {
        writeln!(out, "  Sounds: {}", t.instrumentation.join(", "))?;
    }
    if let Some(style) = &t.production_style {
        writeln!(out, "  Style: {style}")?;
    }

    if !t.structure.is_empty() || t.drop_intensity.is_some() {
        writeln!(out, "\nStructure")?;
        if !t.structure.is_empty() {
            writeln!(out, "  {}", t.structure.join(" -> "))?;
        }
        if let Some(drop) = t.drop_intensity {
            writeln!(out, "  Drop intensity: {drop}/10")?;
        }
    }

    writeln!(out, "\nGenre")?;
    match &t.subgenre {
        Some(sub) => writeln!(out, "  {} / {sub}", t.genre)?,
        None => writeln!(out, "  {}", t.genre)?,
    }
    if !t.similar_artists.is_empty() {
        writeln!(out, "  Similar to: {}", t.similar_artists.join(", "))?;
    }

    if !t.description.is_empty() {
        writeln!(out, "\nDescription")?;
        writeln!(out, "  {}", t.description)?;
    }

    writeln!(out, "\nID: {}", t.id)?;
    writeln!(out, "Path: {}", t.file_path.display())?;
    Ok(())
}
