use serde::{Deserialize, Serialize};

use crate::domain::{MovieDetail, MovieId, MovieSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularMoviesResponse {
    #[serde(default)]
    pub results: Vec<MovieRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetailRecord {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

impl From<MovieRecord> for MovieSummary {
    fn from(value: MovieRecord) -> Self {
        Self {
            id: value.id,
            title: value.title,
            poster_path: value.poster_path.unwrap_or_default(),
            backdrop_path: value.backdrop_path.unwrap_or_default(),
        }
    }
}

impl From<MovieDetailRecord> for MovieDetail {
    fn from(value: MovieDetailRecord) -> Self {
        Self {
            id: value.id,
            title: value.title,
            release_date: value.release_date,
            description: value.overview,
            rating: value.vote_average,
            poster_path: value.poster_path.unwrap_or_default(),
            backdrop_path: value.backdrop_path.unwrap_or_default(),
        }
    }
}

impl PopularMoviesResponse {
    pub fn into_summaries(self) -> Vec<MovieSummary> {
        self.results.into_iter().map(MovieSummary::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_record_maps_overview_and_vote_average() {
        let record: MovieDetailRecord = serde_json::from_str(
            r#"{"id":550,"title":"Fight Club","release_date":"1999-10-15",
                "overview":"An insomniac office worker.","vote_average":8.4,
                "poster_path":"/p.jpg","backdrop_path":null}"#,
        )
        .expect("detail record");
        let detail = MovieDetail::from(record);
        assert_eq!(detail.id, MovieId(550));
        assert_eq!(detail.description, "An insomniac office worker.");
        assert_eq!(detail.rating, 8.4);
        assert_eq!(detail.poster_path, "/p.jpg");
        assert_eq!(detail.backdrop_path, "");
    }

    #[test]
    fn popular_response_ignores_unknown_fields() {
        let response: PopularMoviesResponse = serde_json::from_str(
            r#"{"page":1,"results":[{"id":1,"title":"A","poster_path":"/a.jpg",
                "backdrop_path":"/b.jpg","adult":false}],"total_pages":10}"#,
        )
        .expect("popular response");
        let movies = response.into_summaries();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "A");
        assert_eq!(movies[0].backdrop_path, "/b.jpg");
    }
}
