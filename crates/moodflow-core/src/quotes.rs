use chrono::Datelike;

use crate::models::Mood;
use crate::time_utils::CalendarDay;

const HAPPY: [&str; 5] = [
    "Keep shining! Your happiness lights up the day. ✨",
    "What great energy! Enjoy every moment of joy. 🌟",
    "Your good mood is contagious. Keep that smile. 😊",
    "It is wonderful to see you this happy. Savour it. 🎉",
    "You are an inspiration when you are this joyful! 💫",
];

const GOOD: [&str; 5] = [
    "Keep it up, you are on the right track. 👍",
    "A positive day ahead! Hold on to that energy. 🌈",
    "You feel good, and it shows. Carry on. 💪",
    "Enjoy this calm, you deserve it. ☀️",
    "Your inner balance is taking you somewhere good. 🌸",
];

const NEUTRAL: [&str; 5] = [
    "Every day is a new opportunity. Stay open. 🌿",
    "Balance is a strength too. Take your time. ⚖️",
    "Sometimes a neutral day helps you see clearly. 🧘",
    "It is OK not to be at your best. Be kind to yourself. 💙",
    "Tomorrow is a new day full of possibilities. 🌅",
];

const SAD: [&str; 5] = [
    "Hard days do not last forever. You are strong. 💜",
    "Take care of yourself, you deserve all the gentleness in the world. 🤗",
    "Every cloud passes eventually. The sun will come back. 🌤️",
    "Your sadness is valid. Give yourself some compassion. 💖",
    "Tomorrow is a blank page. Keep hope. 🌺",
];

const ANGRY: [&str; 5] = [
    "Your anger is legitimate. Take time to breathe. 🌊",
    "Every storm calms down in the end. You will get there. 🍃",
    "Turn this energy into something positive. You can do it. 💪",
    "It is OK to feel angry. Welcome the emotion. 🔥",
    "Take a moment for yourself. You deserve some peace. 🕊️",
];

/// All encouragement quotes for a mood.
pub fn quotes(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &HAPPY,
        Mood::Good => &GOOD,
        Mood::Neutral => &NEUTRAL,
        Mood::Sad => &SAD,
        Mood::Angry => &ANGRY,
    }
}

/// Pick a quote for `mood`, rotating with the day of the year so the same
/// day always shows the same line.
pub fn quote_for(mood: Mood, day: CalendarDay) -> &'static str {
    let pool = quotes(mood);
    pool[day.ordinal0() as usize % pool.len()]
}
