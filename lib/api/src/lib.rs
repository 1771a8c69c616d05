//! # SimRec API
//!
//! REST front end for the recommendation engine.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/health` | 200 once the dataset is loaded, 503 before |
//! | GET | `/items/{item_id}` | catalog entry |
//! | GET | `/items/{item_id}/recommendations?top_n=&min_similarity=` | ranked list |
//! | POST | `/recommendations/batch` | `{"ids": [...], "top_n"?, "min_similarity"?}` |

pub mod rest;

pub use rest::RestApi;
