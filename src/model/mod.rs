pub mod aggregates;
pub mod case;
pub mod final_score;
