use std::collections::{HashMap, VecDeque};

use crate::errors::EngineError;
use crate::types::{
  EngineSnapshot, MatchSnapshot, TeamRecord, ROTATE_OUT_STREAK, WINNER_STAYS_ROSTER_MAX,
};

/// The two table positions, numbered 1 and 2 on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSide {
  One,
  Two,
}

impl TableSide {
  pub fn from_number(n: u8) -> Option<TableSide> {
    match n {
      1 => Some(TableSide::One),
      2 => Some(TableSide::Two),
      _ => None,
    }
  }

  fn index(self) -> usize {
    match self {
      TableSide::One => 0,
      TableSide::Two => 1,
    }
  }
}

// Unoccupied slots always carry score 0 and streak 0.
#[derive(Clone, Debug, Default, PartialEq)]
struct MatchSlot {
  team: Option<String>,
  score: u32,
  streak: u32,
}

impl MatchSlot {
  fn occupy(team: String) -> Self {
    MatchSlot {
      team: Some(team),
      score: 0,
      streak: 0,
    }
  }

  fn clear(&mut self) {
    *self = MatchSlot::default();
  }
}

/// Winner-stays-on table state: the current match, the waiting queue, the
/// roster, and cumulative win/loss records.
///
/// Every operation is a synchronous in-memory transition and leaves the
/// state untouched when it fails. Persistence is the caller's concern;
/// the command layer snapshots after each successful mutation.
pub struct MatchEngine {
  slots: [MatchSlot; 2],
  queue: VecDeque<String>,
  roster: Vec<String>,
  stats: HashMap<String, TeamRecord>,
}

impl Default for MatchEngine {
  fn default() -> Self {
    MatchEngine::new()
  }
}

impl MatchEngine {
  pub fn new() -> Self {
    MatchEngine {
      slots: [MatchSlot::default(), MatchSlot::default()],
      queue: VecDeque::new(),
      roster: Vec::new(),
      stats: HashMap::new(),
    }
  }

  pub fn from_snapshot(snapshot: EngineSnapshot) -> Self {
    let EngineSnapshot {
      current_match,
      queue,
      all_teams,
      stats,
    } = snapshot;
    MatchEngine {
      slots: [
        slot_from_parts(
          current_match.team1,
          current_match.score1,
          current_match.team1_streak,
        ),
        slot_from_parts(
          current_match.team2,
          current_match.score2,
          current_match.team2_streak,
        ),
      ],
      queue: queue.into(),
      roster: all_teams,
      stats,
    }
  }

  pub fn snapshot(&self) -> EngineSnapshot {
    EngineSnapshot {
      current_match: MatchSnapshot {
        team1: self.slots[0].team.clone().unwrap_or_default(),
        team2: self.slots[1].team.clone().unwrap_or_default(),
        score1: self.slots[0].score,
        score2: self.slots[1].score,
        team1_streak: self.slots[0].streak,
        team2_streak: self.slots[1].streak,
      },
      queue: self.queue.iter().cloned().collect(),
      all_teams: self.roster.clone(),
      stats: self.stats.clone(),
    }
  }

  /// Add a team to the roster, seating it at the table if a side is free
  /// and queueing it otherwise.
  pub fn add_team(&mut self, name: &str) -> Result<(), EngineError> {
    if self.roster.iter().any(|team| team == name) {
      return Err(EngineError::DuplicateTeam);
    }
    self.roster.push(name.to_string());
    self.stats.entry(name.to_string()).or_default();

    if self.slots[0].team.is_none() {
      self.slots[0] = MatchSlot::occupy(name.to_string());
    } else if self.slots[1].team.is_none() {
      self.slots[1] = MatchSlot::occupy(name.to_string());
    } else {
      self.queue.push_back(name.to_string());
    }
    Ok(())
  }

  /// Remove a team from the roster, the queue, and whichever table side it
  /// occupies. Idempotent; its win/loss record is kept.
  pub fn remove_team(&mut self, name: &str) {
    self.roster.retain(|team| team != name);
    self.queue.retain(|team| team != name);
    for slot in &mut self.slots {
      if slot.team.as_deref() == Some(name) {
        slot.clear();
      }
    }
  }

  /// Apply a signed delta to one side's score. The result never drops
  /// below zero, however large the negative delta.
  pub fn adjust_score(&mut self, side: TableSide, delta: i64) {
    let slot = &mut self.slots[side.index()];
    slot.score = apply_delta(slot.score, delta);
  }

  /// Zero both scores. Streaks, seating, queue, and records are untouched.
  pub fn reset_scores(&mut self) {
    self.slots[0].score = 0;
    self.slots[1].score = 0;
  }

  /// Resolve the current match: update records, send the loser to the back
  /// of the queue, and either keep the winner seated or rotate it out once
  /// its streak hits the threshold on a roster of more than
  /// `WINNER_STAYS_ROSTER_MAX` teams. Returns the outcome summary shown to
  /// the user.
  pub fn finish_match(&mut self) -> Result<String, EngineError> {
    let (Some(team1), Some(team2)) = (self.slots[0].team.clone(), self.slots[1].team.clone())
    else {
      return Err(EngineError::IncompleteMatch);
    };
    if self.slots[0].score == self.slots[1].score {
      return Err(EngineError::TiedScore);
    }

    let (winner_index, loser_index, winner, loser) = if self.slots[0].score > self.slots[1].score {
      (0, 1, team1, team2)
    } else {
      (1, 0, team2, team1)
    };
    let winner_streak = self.slots[winner_index].streak + 1;

    self.stats.entry(winner.clone()).or_default().wins += 1;
    self.stats.entry(loser.clone()).or_default().losses += 1;

    // The loser always rejoins the back of the queue, never duplicated.
    self.queue.retain(|team| team != &loser);
    self.queue.push_back(loser);

    let mut message = format!("{winner} wins! ");

    if self.roster.len() > WINNER_STAYS_ROSTER_MAX && winner_streak >= ROTATE_OUT_STREAK {
      // Rotate-out: the winner joins the back of the queue as well and the
      // front two queued teams take the table.
      self.queue.retain(|team| team != &winner);
      self.queue.push_back(winner.clone());
      message.push_str(&format!(
        "{winner} has won 2 games in a row and goes to the queue. "
      ));

      if self.queue.len() >= 2 {
        let next1 = self.queue.pop_front().unwrap_or_default();
        let next2 = self.queue.pop_front().unwrap_or_default();
        message.push_str(&format!("Next match: {next1} vs {next2}"));
        self.slots[0] = MatchSlot::occupy(next1);
        self.slots[1] = MatchSlot::occupy(next2);
      } else {
        self.slots[0].clear();
        self.slots[1].clear();
        message.push_str("Not enough teams in queue for next match.");
      }
    } else {
      // Winner stays in its seat with the bumped streak and a fresh score.
      message.push_str(&format!("{winner} stays on (streak: {winner_streak}). "));
      self.slots[winner_index].streak = winner_streak;
      self.slots[winner_index].score = 0;

      // The front is checked after the loser's append, so with only two
      // teams the loser steps straight back in.
      if self.queue.front().is_some_and(|front| front != &winner) {
        let next = self.queue.pop_front().unwrap_or_default();
        message.push_str(&format!("{next} comes in to challenge!"));
        self.slots[loser_index] = MatchSlot::occupy(next);
      } else {
        self.slots[loser_index].clear();
        message.push_str("No teams in queue to replace loser.");
      }
    }

    Ok(message)
  }

  /// Full system reset: match, queue, roster, and records all wiped
  /// together. This is what the frontend's "clear all stats" does.
  pub fn reset_all(&mut self) {
    self.slots[0].clear();
    self.slots[1].clear();
    self.queue.clear();
    self.roster.clear();
    self.stats.clear();
  }
}

fn slot_from_parts(team: String, score: u32, streak: u32) -> MatchSlot {
  if team.is_empty() {
    // Unoccupied sides never carry a score or streak, whatever an old
    // snapshot says.
    MatchSlot::default()
  } else {
    MatchSlot {
      team: Some(team),
      score,
      streak,
    }
  }
}

fn apply_delta(score: u32, delta: i64) -> u32 {
  if delta < 0 {
    let drop = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
    score.saturating_sub(drop)
  } else {
    let gain = u32::try_from(delta).unwrap_or(u32::MAX);
    score.saturating_add(gain)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn engine_with_teams(names: &[&str]) -> MatchEngine {
    let mut engine = MatchEngine::new();
    for name in names {
      engine.add_team(name).expect("add team");
    }
    engine
  }

  fn queue_of(engine: &MatchEngine) -> Vec<String> {
    engine.queue.iter().cloned().collect()
  }

  fn seated(engine: &MatchEngine) -> (Option<String>, Option<String>) {
    (engine.slots[0].team.clone(), engine.slots[1].team.clone())
  }

  #[test]
  fn test_add_team_placement_order() {
    let engine = engine_with_teams(&["A", "B", "C", "D"]);
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("B".to_string())));
    assert_eq!(queue_of(&engine), vec!["C", "D"]);
    assert_eq!(engine.roster, vec!["A", "B", "C", "D"]);
    assert_eq!(engine.stats.len(), 4);
  }

  #[test]
  fn test_add_duplicate_team_rejected() {
    let mut engine = engine_with_teams(&["A"]);
    let before = engine.snapshot();
    assert_eq!(engine.add_team("A"), Err(EngineError::DuplicateTeam));
    assert_eq!(engine.snapshot(), before);
  }

  #[test]
  fn test_adjust_score_never_negative() {
    let mut engine = engine_with_teams(&["A", "B"]);
    engine.adjust_score(TableSide::One, -5);
    assert_eq!(engine.slots[0].score, 0);
    engine.adjust_score(TableSide::One, 3);
    engine.adjust_score(TableSide::One, -100);
    assert_eq!(engine.slots[0].score, 0);
    engine.adjust_score(TableSide::Two, i64::MIN);
    assert_eq!(engine.slots[1].score, 0);
    engine.adjust_score(TableSide::Two, 2);
    engine.adjust_score(TableSide::Two, -1);
    assert_eq!(engine.slots[1].score, 1);
  }

  #[test]
  fn test_reset_scores_leaves_everything_else() {
    let mut engine = engine_with_teams(&["A", "B", "C"]);
    engine.adjust_score(TableSide::One, 4);
    engine.adjust_score(TableSide::Two, 2);
    engine.slots[0].streak = 3;
    engine.reset_scores();
    assert_eq!(engine.slots[0].score, 0);
    assert_eq!(engine.slots[1].score, 0);
    assert_eq!(engine.slots[0].streak, 3);
    assert_eq!(queue_of(&engine), vec!["C"]);
    assert_eq!(engine.roster.len(), 3);
  }

  #[test]
  fn test_finish_with_tie_mutates_nothing() {
    let mut engine = engine_with_teams(&["A", "B", "C"]);
    engine.adjust_score(TableSide::One, 2);
    engine.adjust_score(TableSide::Two, 2);
    let before = engine.snapshot();
    assert_eq!(engine.finish_match(), Err(EngineError::TiedScore));
    assert_eq!(engine.snapshot(), before);
  }

  #[test]
  fn test_finish_with_empty_side_mutates_nothing() {
    let mut engine = engine_with_teams(&["A"]);
    engine.adjust_score(TableSide::One, 3);
    let before = engine.snapshot();
    assert_eq!(engine.finish_match(), Err(EngineError::IncompleteMatch));
    assert_eq!(engine.snapshot(), before);

    let mut empty = MatchEngine::new();
    assert_eq!(empty.finish_match(), Err(EngineError::IncompleteMatch));
  }

  #[test]
  fn test_two_team_loser_steps_straight_back_in() {
    let mut engine = engine_with_teams(&["A", "B"]);
    engine.adjust_score(TableSide::One, 5);
    engine.adjust_score(TableSide::Two, 3);
    let message = engine.finish_match().expect("finish");
    assert!(message.starts_with("A wins!"));
    assert!(message.contains("stays on (streak: 1)"));
    assert!(message.contains("B comes in to challenge!"));
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("B".to_string())));
    assert_eq!(engine.slots[0].streak, 1);
    assert_eq!(engine.slots[0].score, 0);
    assert_eq!(engine.slots[1].streak, 0);
    assert_eq!(engine.slots[1].score, 0);
    assert!(engine.queue.is_empty());
    assert_eq!(engine.stats["A"], TeamRecord { wins: 1, losses: 0 });
    assert_eq!(engine.stats["B"], TeamRecord { wins: 0, losses: 1 });
  }

  #[test]
  fn test_three_team_winner_stays_past_streak_two() {
    let mut engine = engine_with_teams(&["A", "B", "C"]);
    engine.adjust_score(TableSide::One, 2);
    engine.finish_match().expect("first finish");
    // A beat B; C challenges, B waits.
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("C".to_string())));
    assert_eq!(queue_of(&engine), vec!["B"]);

    engine.adjust_score(TableSide::One, 2);
    let message = engine.finish_match().expect("second finish");
    // Streak 2, but the roster is only 3: A is not rotated out.
    assert!(message.contains("A stays on (streak: 2)"));
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("B".to_string())));
    assert_eq!(engine.slots[0].streak, 2);
    assert_eq!(queue_of(&engine), vec!["C"]);
  }

  #[test]
  fn test_four_team_rotate_out_refills_from_queue() {
    let mut engine = engine_with_teams(&["A", "B", "C", "D"]);
    engine.adjust_score(TableSide::One, 2);
    engine.finish_match().expect("first finish");
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("C".to_string())));
    assert_eq!(queue_of(&engine), vec!["D", "B"]);

    engine.adjust_score(TableSide::One, 2);
    let message = engine.finish_match().expect("second finish");
    assert!(message.contains("A has won 2 games in a row and goes to the queue."));
    assert!(message.contains("Next match: D vs B"));
    assert_eq!(seated(&engine), (Some("D".to_string()), Some("B".to_string())));
    assert_eq!(engine.slots[0].streak, 0);
    assert_eq!(engine.slots[1].streak, 0);
    assert_eq!(queue_of(&engine), vec!["C", "A"]);
    assert_eq!(engine.stats["A"], TeamRecord { wins: 2, losses: 0 });
    assert_eq!(engine.stats["C"], TeamRecord { wins: 0, losses: 1 });
  }

  #[test]
  fn test_loser_lands_at_back_without_duplicates() {
    // Queue already holds the loser (caller-bug state); the engine
    // de-dupes before re-appending.
    let mut snapshot = engine_with_teams(&["A", "B", "C", "D"]).snapshot();
    snapshot.queue = vec!["B".into(), "C".into(), "D".into()];
    let mut engine = MatchEngine::from_snapshot(snapshot);
    engine.adjust_score(TableSide::One, 1);
    engine.finish_match().expect("finish");
    let queue = queue_of(&engine);
    assert_eq!(queue.iter().filter(|team| *team == "B").count(), 1);
    assert_eq!(queue.last().map(String::as_str), Some("B"));
  }

  #[test]
  fn test_remove_team_clears_only_its_side() {
    let mut engine = engine_with_teams(&["A", "B", "C"]);
    engine.adjust_score(TableSide::One, 3);
    engine.adjust_score(TableSide::Two, 2);
    engine.slots[0].streak = 1;
    engine.remove_team("A");
    assert_eq!(seated(&engine), (None, Some("B".to_string())));
    assert_eq!(engine.slots[0].score, 0);
    assert_eq!(engine.slots[0].streak, 0);
    assert_eq!(engine.slots[1].score, 2);
    assert_eq!(queue_of(&engine), vec!["C"]);
    assert_eq!(engine.roster, vec!["B", "C"]);
    // The record survives removal.
    assert!(engine.stats.contains_key("A"));
  }

  #[test]
  fn test_remove_team_is_idempotent() {
    let mut engine = engine_with_teams(&["A", "B"]);
    let before = engine.snapshot();
    engine.remove_team("nobody");
    assert_eq!(engine.snapshot(), before);
    engine.remove_team("B");
    engine.remove_team("B");
    assert_eq!(seated(&engine), (Some("A".to_string()), None));
  }

  #[test]
  fn test_remove_queued_team() {
    let mut engine = engine_with_teams(&["A", "B", "C", "D"]);
    engine.remove_team("C");
    assert_eq!(queue_of(&engine), vec!["D"]);
    assert_eq!(seated(&engine), (Some("A".to_string()), Some("B".to_string())));
  }

  #[test]
  fn test_reset_all_wipes_everything() {
    let mut engine = engine_with_teams(&["A", "B", "C"]);
    engine.adjust_score(TableSide::One, 2);
    engine.finish_match().expect("finish");
    engine.reset_all();
    assert_eq!(engine.snapshot(), EngineSnapshot::default());
  }

  #[test]
  fn test_snapshot_round_trip() {
    let mut engine = engine_with_teams(&["A", "B", "C", "D"]);
    engine.adjust_score(TableSide::One, 2);
    engine.finish_match().expect("finish");
    let snapshot = engine.snapshot();
    let restored = MatchEngine::from_snapshot(snapshot.clone());
    assert_eq!(restored.snapshot(), snapshot);
  }

  #[test]
  fn test_from_snapshot_zeroes_unoccupied_sides() {
    let snapshot = EngineSnapshot {
      current_match: MatchSnapshot {
        team1: String::new(),
        team2: "B".into(),
        score1: 7,
        score2: 4,
        team1_streak: 5,
        team2_streak: 1,
      },
      ..EngineSnapshot::default()
    };
    let engine = MatchEngine::from_snapshot(snapshot);
    assert_eq!(engine.slots[0], MatchSlot::default());
    assert_eq!(engine.slots[1].score, 4);
    assert_eq!(engine.slots[1].streak, 1);
  }
}
