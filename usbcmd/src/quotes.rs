//! Farewell quotations shown when a session closes.

use rand::seq::SliceRandom;

pub const QUIT_QUOTES: &[&str] = &[
    // Persistence & Determination
    "It's not that I'm so smart, it's just that I stay with problems longer. - Albert Einstein",
    "Never give up on something that you can't go a day without thinking about. - Winston Churchill",
    "Our greatest weakness lies in giving up. The most certain way to succeed is always to try just one more time. - Thomas Edison",
    "It does not matter how slowly you go as long as you do not stop. - Confucius",
    "Never give up, for that is just the place and time that the tide will turn. - Harriet Beecher Stowe",
    "You just can't beat the person who won't give up. - Babe Ruth",
    "Winners never quit, and quitters never win. - Vince Lombardi",
    "Perseverance is not a long race; it is many short races one after the other. - Walter Elliot",
    "The difference between a successful person and others is not a lack of strength, not a lack of knowledge, but rather a lack in will. - Vince Lombardi",
    "Never, never, never give up. - Winston Churchill",
    "Courage is not having the strength to go on; it is going on when you don't have the strength. - Theodore Roosevelt",
    "Many of life's failures are people who did not realize how close they were to success when they gave up. - Thomas Edison",
    "I have not failed. I've just found 10,000 ways that won't work. - Thomas Edison",
    "When you get into a tight place and everything goes against you, never give up then, for that is just the time that the tide will turn. - Harriet Beecher Stowe",

    // Motivation & Inspiration
    "It always seems impossible until it's done. - Nelson Mandela",
    "Believe you can and you're halfway there. - Theodore Roosevelt",
    "The only failure is not trying. - George Clooney",
    "The secret of getting ahead is getting started. - Mark Twain",
    "Don't watch the clock; do what it does. Keep going. - Sam Levenson",
    "If you're going through hell, keep going. - Winston Churchill",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. - Winston Churchill",
    "The only way to do great work is to love what you do. - Steve Jobs",
    "Start where you are. Use what you have. Do what you can. - Arthur Ashe",
    "Believe in yourself. You are braver than you think, more talented than you know, and capable of more than you imagine. - Roy T. Bennett",
    "I learned that courage was not the absence of fear, but the triumph over it. - Nelson Mandela",
    "Do not let what you cannot do interfere with what you can do. - John Wooden",

    // Wisdom & Proverbs
    "Fall seven times, stand up eight. - Japanese Proverb",
    "A journey of a thousand miles begins with a single step. - Lao Tzu",
    "The harder the struggle, the more glorious the triumph. - Unknown",
    "Tough times never last, but tough people do. - Robert Schuller",
    "When everything seems to be going against you, remember that the airplane takes off against the wind, not with it. - Henry Ford",
    "Rock bottom became the solid foundation on which I rebuilt my life. - J.K. Rowling",
    "You may have to fight a battle more than once to win it. - Margaret Thatcher",
    "What lies behind us and what lies before us are tiny matters compared to what lies within us. - Ralph Waldo Emerson",

    // Overcoming Obstacles
    "Obstacles don't have to stop you. If you run into a wall, don't turn around and give up. Figure out how to climb it. - Michael Jordan",
    "The brick walls are there for a reason. They're not there to keep us out. The brick walls are there to give us a chance to show how badly we want something. - Randy Pausch",
    "Strength doesn't come from what you can do. It comes from overcoming the things you once thought you couldn't. - Rikki Rogers",
    "When you feel like quitting, think about why you started. - Unknown",
    "Challenges are what make life interesting. Overcoming them is what makes life meaningful. - Joshua Marine",
    "The only limit to our realization of tomorrow will be our doubts of today. - Franklin D. Roosevelt",

    // Growth & Progress
    "The only impossible journey is the one you never begin. - Tony Robbins",
    "Don't be afraid to give up the good to go for the great. - John D. Rockefeller",
    "You don't have to be great to start, but you have to start to be great. - Zig Ziglar",
    "The future belongs to those who believe in the beauty of their dreams. - Eleanor Roosevelt",
    "Success is the sum of small efforts repeated day in and day out. - Robert Collier",
    "Little by little, one travels far. - J.R.R. Tolkien",
    "A little progress each day adds up to big results. - Satya Nani",

    // Resilience
    "Life is 10% what happens to you and 90% how you react to it. - Charles R. Swindoll",
    "I can accept failure, everyone fails at something. But I can't accept not trying. - Michael Jordan",
    "Failure is simply the opportunity to begin again, this time more intelligently. - Henry Ford",
    "You are never too old to set another goal or to dream a new dream. - C.S. Lewis",
    "Do not judge me by my success, judge me by how many times I fell down and got back up again. - Nelson Mandela",
    "Our greatest glory is not in never falling, but in rising every time we fall. - Confucius",

    // Determination
    "The man who moves a mountain begins by carrying away small stones. - Confucius",
    "It's hard to beat a person who never gives up. - Babe Ruth",
    "I will persist until I succeed. - Og Mandino",
    "Never give in except to convictions of honor and good sense. - Winston Churchill",
    "Keep your face always toward the sunshine, and shadows will fall behind you. - Walt Whitman",
    "Energy and persistence conquer all things. - Benjamin Franklin",
];

/// Pick a quotation uniformly at random.
pub fn random_quote() -> &'static str {
    QUIT_QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Goodbye.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_comes_from_table() {
        for _ in 0..20 {
            assert!(QUIT_QUOTES.contains(&random_quote()));
        }
    }

    #[test]
    fn every_quote_is_attributed() {
        for quote in QUIT_QUOTES {
            assert!(quote.contains(" - "), "unattributed: {quote}");
        }
    }
}
