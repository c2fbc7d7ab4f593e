//! Sample flight schedule used for demos and tests.

use crate::flight::Flight;

type Row = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, &'static str, f64, u32, bool);

const SAMPLE_FLIGHTS: &[Row] = &[
    // Warsaw to Paris
    ("WAW#CDG", "LO335", "2025-03-15", "LOT Polish Airlines", "06:45", "09:10", "Boeing 737-800", 450.0, 42, true),
    ("WAW#CDG", "AF1145", "2025-03-15", "Air France", "08:30", "10:45", "Airbus A320", 380.0, 23, true),
    ("WAW#CDG", "LH1234", "2025-03-15", "Lufthansa", "14:20", "16:35", "Airbus A319", 520.0, 8, true),
    ("WAW#CDG", "LO337", "2025-03-16", "LOT Polish Airlines", "07:00", "09:25", "Embraer E195", 410.0, 35, true),
    ("WAW#CDG", "AF1147", "2025-03-16", "Air France", "12:15", "14:30", "Airbus A320", 395.0, 18, true),
    ("WAW#CDG", "LO339", "2025-03-17", "LOT Polish Airlines", "06:45", "09:10", "Boeing 737-800", 430.0, 50, true),
    // Warsaw to Rome
    ("WAW#FCO", "LO521", "2025-03-15", "LOT Polish Airlines", "09:00", "11:45", "Boeing 737-MAX 8", 490.0, 30, true),
    ("WAW#FCO", "AZ601", "2025-03-15", "ITA Airways", "13:30", "16:15", "Airbus A320neo", 420.0, 15, true),
    ("WAW#FCO", "FR8821", "2025-03-16", "Ryanair", "06:00", "08:50", "Boeing 737-800", 120.0, 60, false),
    ("WAW#FCO", "LO523", "2025-03-17", "LOT Polish Airlines", "10:15", "13:00", "Embraer E195", 470.0, 25, true),
    // New York to London
    ("JFK#LHR", "BA178", "2025-03-15", "British Airways", "19:00", "07:15", "Boeing 777-300ER", 890.0, 45, true),
    ("JFK#LHR", "VS4", "2025-03-15", "Virgin Atlantic", "21:30", "09:45", "Airbus A350-1000", 820.0, 32, true),
    ("JFK#LHR", "AA100", "2025-03-16", "American Airlines", "18:00", "06:10", "Boeing 777-200ER", 950.0, 12, true),
    ("JFK#LHR", "BA180", "2025-03-17", "British Airways", "22:00", "10:15", "Airbus A380", 870.0, 55, true),
    // Paris to New York
    ("CDG#JFK", "AF22", "2025-03-15", "Air France", "10:30", "13:15", "Boeing 777-300ER", 780.0, 38, true),
    ("CDG#JFK", "DL263", "2025-03-15", "Delta Air Lines", "14:00", "16:45", "Airbus A330-900neo", 720.0, 22, true),
    ("CDG#JFK", "AF24", "2025-03-16", "Air France", "09:00", "11:45", "Airbus A350-900", 810.0, 40, true),
    ("CDG#JFK", "UA57", "2025-03-17", "United Airlines", "11:30", "14:15", "Boeing 767-400ER", 690.0, 28, true),
];

/// Returns the sample schedule: four routes over 15-17 March 2025.
pub fn sample_flights() -> Vec<Flight> {
    SAMPLE_FLIGHTS
        .iter()
        .map(
            |&(route, flight_id, date, airline, departure, arrival, aircraft, price, seats, baggage)| Flight {
                route: route.to_string(),
                flight_id: flight_id.to_string(),
                date: date.to_string(),
                airline: airline.to_string(),
                departure_time: departure.to_string(),
                arrival_time: arrival.to_string(),
                aircraft: aircraft.to_string(),
                price,
                available_seats: seats,
                baggage_included: baggage,
            },
        )
        .collect()
}
