//! Built-in fallback content: canned problems and feedback templates.
//!
//! These guarantee the app stays useful when the text-generation backend is
//! missing, failing, or returning unusable output. Selection goes through a
//! `Picker` so tests can pin the choice.

use rand::Rng;

use crate::domain::NewProblem;

/// Canned Primary 5 problems: (text, answer).
pub const FALLBACK_PROBLEMS: [(&str, f64); 5] = [
  (
    "At a hawker centre, a plate of chicken rice costs $3.50 and a cup of tea costs $1.20. If Sarah buys 2 plates of chicken rice and 3 cups of tea, how much does she pay in total?",
    10.6,
  ),
  (
    "The MRT train from Jurong East to Raffles Place takes 25 minutes. If the train leaves at 7:15 AM, at what time will it arrive at Raffles Place? Express your answer in hours and minutes as a decimal (e.g., 7.75 for 7:45 AM).",
    7.67,
  ),
  (
    "A recipe requires 3/4 cup of sugar. If Mei Ling wants to make 5 batches of the recipe, how many cups of sugar does she need?",
    3.75,
  ),
  (
    "In a class of 40 students, 60% are girls. How many boys are there in the class?",
    16.0,
  ),
  (
    "The ratio of red marbles to blue marbles in a bag is 3:5. If there are 24 blue marbles, how many red marbles are there?",
    15.0,
  ),
];

const POSITIVE_FEEDBACK: [&str; 4] = [
  "Well done! You've applied the Singapore math concepts correctly.",
  "Excellent work! Your understanding of the problem shows good mathematical thinking.",
  "Very good! You've solved this Primary 5 problem perfectly.",
  "Great job! Your answer shows you understand the mathematical concept well.",
];

// `{correct_answer}` is filled in at selection time.
const CONSTRUCTIVE_FEEDBACK: [&str; 4] = [
  "Good try! The correct answer is {correct_answer}. Remember to read the problem carefully and identify the key information.",
  "Not quite right. The answer is {correct_answer}. Think about the Singapore math concepts we've learned for this type of problem.",
  "Good effort! The correct answer is {correct_answer}. Try using the bar model method to visualize the problem.",
  "You're on the right track! The answer is {correct_answer}. Check if you've applied the correct mathematical operation.",
];

/// Source of the uniform choice among fallback options.
pub trait Picker: Send + Sync {
  /// Returns an index in `0..len`. `len` is never zero.
  fn index(&self, len: usize) -> usize;
}

/// Uniform choice backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPicker;

impl Picker for RandomPicker {
  fn index(&self, len: usize) -> usize {
    rand::thread_rng().gen_range(0..len)
  }
}

/// Always picks the same slot (wrapped into range).
#[cfg(test)]
#[derive(Clone, Copy, Debug)]
pub struct FixedPicker(pub usize);

#[cfg(test)]
impl Picker for FixedPicker {
  fn index(&self, len: usize) -> usize {
    self.0 % len
  }
}

pub fn fallback_problem(picker: &dyn Picker) -> NewProblem {
  let (text, answer) = FALLBACK_PROBLEMS[picker.index(FALLBACK_PROBLEMS.len())];
  NewProblem { problem_text: text.to_string(), correct_answer: answer }
}

pub fn fallback_feedback(picker: &dyn Picker, is_correct: bool, correct_answer: f64) -> String {
  if is_correct {
    POSITIVE_FEEDBACK[picker.index(POSITIVE_FEEDBACK.len())].to_string()
  } else {
    let tpl = CONSTRUCTIVE_FEEDBACK[picker.index(CONSTRUCTIVE_FEEDBACK.len())];
    let answer = format_answer(correct_answer);
    crate::util::fill_template(tpl, &[("correct_answer", &answer)])
  }
}

/// Render an answer the way a learner would write it (16, not 16.0).
pub fn format_answer(value: f64) -> String {
  format!("{}", value)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fallback_pool_is_well_formed() {
    for (text, answer) in FALLBACK_PROBLEMS {
      assert!(!text.trim().is_empty());
      assert!(answer > 0.0 && answer.is_finite());
    }
  }

  #[test]
  fn fixed_picker_selects_matching_problem() {
    let p = fallback_problem(&FixedPicker(2));
    assert_eq!(p.correct_answer, 3.75);
    assert!(p.problem_text.contains("Mei Ling"));

    let wrapped = fallback_problem(&FixedPicker(5));
    assert_eq!(wrapped.correct_answer, 10.6);
  }

  #[test]
  fn random_picker_stays_in_range() {
    for _ in 0..200 {
      let i = RandomPicker.index(5);
      assert!(i < 5);
    }
    let p = fallback_problem(&RandomPicker);
    assert!(FALLBACK_PROBLEMS.iter().any(|(_, a)| *a == p.correct_answer));
  }

  #[test]
  fn constructive_feedback_mentions_answer() {
    let text = fallback_feedback(&FixedPicker(1), false, 7.67);
    assert_eq!(
      text,
      "Not quite right. The answer is 7.67. Think about the Singapore math concepts we've learned for this type of problem."
    );
    let whole = fallback_feedback(&FixedPicker(0), false, 16.0);
    assert!(whole.contains("The correct answer is 16."));
  }

  #[test]
  fn positive_feedback_comes_from_pool() {
    let text = fallback_feedback(&FixedPicker(3), true, 15.0);
    assert_eq!(text, POSITIVE_FEEDBACK[3]);
    assert!(!text.contains("15"));
  }
}
