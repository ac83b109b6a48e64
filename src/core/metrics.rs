//! Per-turn timing metrics.
//!
//! Each processed turn records how long the pipeline phases took; the
//! aggregate statistics feed the transcript footer and the session APIs.

use serde::Serialize;

/// Phase durations for one processed turn, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TurnTiming {
    /// Speech-capture / recognition time (zero for typed input)
    pub stt_secs: f64,
    /// Language-model time, including refinement
    pub llm_secs: f64,
    /// Speech-synthesis time
    pub tts_secs: f64,
    /// End-to-end latency for the turn
    pub total_secs: f64,
}

/// Aggregate timing statistics across a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingStats {
    pub total_conversations: usize,
    pub avg_total_latency: f64,
    pub min_total_latency: f64,
    pub max_total_latency: f64,
    pub avg_stt_duration: f64,
    pub avg_llm_duration: f64,
    pub avg_tts_duration: f64,
}

impl TimingStats {
    /// Aggregate a timing history. Returns `None` for an empty history.
    pub fn from_history(history: &[TurnTiming]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }
        let n = history.len() as f64;
        let totals: Vec<f64> = history.iter().map(|t| t.total_secs).collect();

        Some(Self {
            total_conversations: history.len(),
            avg_total_latency: totals.iter().sum::<f64>() / n,
            min_total_latency: totals.iter().cloned().fold(f64::INFINITY, f64::min),
            max_total_latency: totals.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            avg_stt_duration: history.iter().map(|t| t.stt_secs).sum::<f64>() / n,
            avg_llm_duration: history.iter().map(|t| t.llm_secs).sum::<f64>() / n,
            avg_tts_duration: history.iter().map(|t| t.tts_secs).sum::<f64>() / n,
        })
    }

    /// Render the plain-text report used in transcript footers.
    pub fn render_report(&self) -> String {
        format!(
            "Total Conversations: {}\n\
             Average Total Latency: {:.2}s\n\
             Best Response Time: {:.2}s\n\
             Worst Response Time: {:.2}s\n\
             Average STT Duration: {:.2}s\n\
             Average LLM Duration: {:.2}s\n\
             Average TTS Duration: {:.2}s\n",
            self.total_conversations,
            self.avg_total_latency,
            self.min_total_latency,
            self.max_total_latency,
            self.avg_stt_duration,
            self.avg_llm_duration,
            self.avg_tts_duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(llm: f64, tts: f64) -> TurnTiming {
        TurnTiming {
            stt_secs: 0.0,
            llm_secs: llm,
            tts_secs: tts,
            total_secs: llm + tts,
        }
    }

    #[test]
    fn test_empty_history() {
        assert!(TimingStats::from_history(&[]).is_none());
    }

    #[test]
    fn test_aggregation() {
        let history = [timing(1.0, 0.5), timing(3.0, 1.5)];
        let stats = TimingStats::from_history(&history).unwrap();

        assert_eq!(stats.total_conversations, 2);
        assert!((stats.avg_total_latency - 3.0).abs() < 1e-9);
        assert!((stats.min_total_latency - 1.5).abs() < 1e-9);
        assert!((stats.max_total_latency - 4.5).abs() < 1e-9);
        assert!((stats.avg_llm_duration - 2.0).abs() < 1e-9);
        assert!((stats.avg_tts_duration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_rendering() {
        let stats = TimingStats::from_history(&[timing(1.0, 1.0)]).unwrap();
        let report = stats.render_report();
        assert!(report.contains("Total Conversations: 1"));
        assert!(report.contains("Average Total Latency: 2.00s"));
    }
}
