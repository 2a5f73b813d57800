//! Scenario tests driving a manager the way an external game loop would
