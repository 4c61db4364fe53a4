use std::io::{stdout, Write};

use crate::{pos, Pos};

pub struct Canvas {
    rows: Vec<Vec<char>>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// Leaves the last terminal row free for the status line.
    pub fn from_screen() -> Self {
        let (width, height) = termion::terminal_size().unwrap();
        Self::new(width as usize, (height - 1) as usize)
    }

    pub fn new(width: usize, height: usize) -> Self {
        let rows = vec![vec![' '; width]; height];
        Self {
            rows,
            width,
            height,
        }
    }

    pub fn layer(&mut self, f: impl Fn(Pos) -> Option<char>) {
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(char) = f(pos!(x as i64, y as i64)) {
                    self.rows[y][x] = char;
                }
            }
        }
    }

    pub fn display(&self) {
        let mut frame = String::new();
        for (index, row) in self.rows.iter().enumerate() {
            let goto = termion::cursor::Goto(1, index as u16 + 1);
            frame += &format!("{goto}");
            frame.extend(row.iter());
        }
        let clear = termion::clear::All;
        print!("{clear}{frame}");
        stdout().flush().unwrap();
    }
}
