use std::collections::HashMap;

use serde::Serialize;

use crate::model::Order;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CityOrders {
    pub country: String,
    pub city: String,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountryOrders {
    pub country: String,
    pub orders: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GeoDistribution {
    pub cities: Vec<CityOrders>,
    pub countries: Vec<CountryOrders>,
    pub total_orders: usize,
}

/// Order counts per customer location. Markers are placed client-side.
pub fn geo_distribution(orders: &[Order]) -> GeoDistribution {
    let mut by_city: HashMap<(&str, &str), usize> = HashMap::new();
    let mut by_country: HashMap<&str, usize> = HashMap::new();

    for order in orders {
        let country = order.customer_country.as_str();
        *by_city.entry((country, order.customer_city.as_str())).or_insert(0) += 1;
        *by_country.entry(country).or_insert(0) += 1;
    }

    let mut cities: Vec<CityOrders> = by_city
        .into_iter()
        .map(|((country, city), orders)| CityOrders {
            country: country.to_string(),
            city: city.to_string(),
            orders,
        })
        .collect();
    cities.sort_by(|a, b| {
        b.orders
            .cmp(&a.orders)
            .then_with(|| a.country.cmp(&b.country))
            .then_with(|| a.city.cmp(&b.city))
    });

    let mut countries: Vec<CountryOrders> = by_country
        .into_iter()
        .map(|(country, orders)| CountryOrders {
            country: country.to_string(),
            orders,
        })
        .collect();
    countries.sort_by(|a, b| b.orders.cmp(&a.orders).then_with(|| a.country.cmp(&b.country)));

    GeoDistribution {
        cities,
        countries,
        total_orders: orders.len(),
    }
}
